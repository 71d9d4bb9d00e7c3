//! Packaging pipeline: select → transform (concurrently) → merge → archive.
//!
//! A minified build runs two units of work under one join:
//!   - script + style chains, merged and stamped with the package header
//!   - config chain, stripped of the build type's exclusion regions and minified
//!
//! The first failure of either unit is returned as the pipeline's error and nothing is
//! written. The archive is only assembled once both units have succeeded.
//!
//! # Navigation
//! - [`build_min`] for release and interactive builds
//! - [`build_dev`] for the unminified developer bundle

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::archive::{relative_entry_name, write_archive, write_tree, Artifact};
use crate::config::{BuildConfig, BuildType, PackageMetadata};
use crate::error::BuildError;
use crate::selector::{self, BuildProfile};
use crate::transform;

/// Outcome of a packaging run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub archive: PathBuf,
    /// Scripts and styles for minified builds, copied files for dev builds.
    pub bundled: usize,
    pub configs: usize,
}

struct SourceFile {
    path: PathBuf,
    entry: String,
    content: String,
}

async fn read_sources(base: &Path, files: Vec<PathBuf>) -> Result<Vec<SourceFile>, BuildError> {
    let reads = files.into_iter().map(|path| async move {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::io(&path, e))?;
        let entry = relative_entry_name(base, &path);
        Ok::<_, BuildError>(SourceFile {
            path,
            entry,
            content,
        })
    });
    try_join_all(reads).await
}

async fn script_chain(base: &Path, files: Vec<PathBuf>) -> Result<Vec<Artifact>, BuildError> {
    let sources = read_sources(base, files).await?;
    sources
        .into_iter()
        .map(|src| {
            info!(file = %src.entry, "Minifying script");
            let code = transform::minify_script(&src.content, &src.path)?;
            Ok(Artifact::new(src.entry, code))
        })
        .collect()
}

async fn style_chain(base: &Path, files: Vec<PathBuf>) -> Result<Vec<Artifact>, BuildError> {
    let sources = read_sources(base, files).await?;
    sources
        .into_iter()
        .map(|src| {
            let css = transform::minify_style(&src.content, &src.path)?;
            info!(
                file = %src.entry,
                original_size = src.content.len(),
                minified_size = css.len(),
                "{} : {} → {}",
                src.entry,
                src.content.len(),
                css.len()
            );
            Ok(Artifact::new(src.entry, css))
        })
        .collect()
}

async fn config_chain(
    base: &Path,
    files: Vec<PathBuf>,
    build_type: BuildType,
) -> Result<Vec<Artifact>, BuildError> {
    let sources = read_sources(base, files).await?;
    sources
        .into_iter()
        .map(|src| {
            let stripped = transform::strip_excludes(&src.content, build_type);
            let json = transform::minify_config(&stripped, &src.path)?;
            info!(file = %src.entry, %build_type, "Filtered and minified config");
            Ok(Artifact::new(src.entry, json))
        })
        .collect()
}

fn stamp_header(header: &str, artifacts: Vec<Artifact>) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .map(|a| {
            let mut content = header.as_bytes().to_vec();
            content.extend_from_slice(&a.content);
            Artifact::new(a.path, content)
        })
        .collect()
}

/// Builds `<resource>-min-<fingerprint>-<build_type>.zip` for `profile`.
pub async fn build_min(
    config: &BuildConfig,
    profile: &BuildProfile,
    metadata: &PackageMetadata,
) -> Result<BuildReport, BuildError> {
    info!(
        build_type = %profile.build_type(),
        fingerprint = %profile.fingerprint(),
        "[BUILD] Starting minified build"
    );
    let selection = selector::select(config, profile);
    let root = &config.project_root;
    let base = config.components_root();

    let script_files = selector::expand(root, &selection.scripts)?;
    let style_files = selector::expand(root, &selection.styles)?;
    let config_files = selector::expand(root, &selection.configs)?;
    let header = transform::header(metadata);

    let bundle_unit = async {
        let (scripts, styles) = tokio::try_join!(
            script_chain(&base, script_files),
            style_chain(&base, style_files)
        )?;
        let counts = (scripts.len(), styles.len());
        let mut merged = scripts;
        merged.extend(styles);
        Ok::<_, BuildError>((stamp_header(&header, merged), counts))
    };
    let config_unit = config_chain(&base, config_files, profile.build_type());

    let ((mut artifacts, (scripts, styles)), configs) =
        match tokio::try_join!(bundle_unit, config_unit) {
            Ok(done) => done,
            Err(e) => {
                error!(error = %e, "[BUILD][ERROR] Pipeline step failed, no archive written");
                return Err(e);
            }
        };
    let config_count = configs.len();
    artifacts.extend(configs);

    let archive = write_archive(&root.join(config.min_archive_name(profile)), &artifacts)?;
    info!(
        archive = %archive.display(),
        scripts,
        styles,
        configs = config_count,
        "[BUILD] Minified build complete"
    );
    Ok(BuildReport {
        archive,
        bundled: scripts + styles,
        configs: config_count,
    })
}

/// Builds the developer bundle: every component file copied verbatim except configs, which
/// are stripped of dev exclusion regions and minified. The result is written unpacked to the
/// bundle directory and zipped to `<resource>-dev.zip`.
pub async fn build_dev(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    info!("[BUILD] Starting dev build");
    let root = &config.project_root;
    let base = config.components_root();
    let dir = relative_entry_name(root, &base);

    let config_files = selector::expand(root, &[format!("{dir}/skuid_*.json")])?;
    let all_files = selector::expand(root, &[format!("{dir}/**/*.*")])?;
    let plain_files: Vec<PathBuf> = all_files
        .into_iter()
        .filter(|f| !config_files.contains(f))
        .collect();

    let copy_unit = async {
        let reads = plain_files.iter().map(|path| {
            let base = &base;
            async move {
                let content = tokio::fs::read(path)
                    .await
                    .map_err(|e| BuildError::io(path, e))?;
                Ok::<_, BuildError>(Artifact::new(relative_entry_name(base, path), content))
            }
        });
        try_join_all(reads).await
    };
    let config_unit = config_chain(&base, config_files, BuildType::Dev);

    let (mut artifacts, configs) = tokio::try_join!(copy_unit, config_unit).map_err(|e| {
        error!(error = %e, "[BUILD][ERROR] Dev build failed");
        e
    })?;
    let plain = artifacts.len();
    let config_count = configs.len();
    artifacts.extend(configs);

    write_tree(&config.dev_bundle_path(), &artifacts).await?;
    let archive = write_archive(&root.join(config.dev_archive_name()), &artifacts)?;
    info!(archive = %archive.display(), files = artifacts.len(), "[BUILD] Dev build complete");

    Ok(BuildReport {
        archive,
        bundled: plain,
        configs: config_count,
    })
}
