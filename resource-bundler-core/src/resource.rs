//! Static resource wrapping and cleanup of previous build outputs.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{BuildConfig, BuildType};
use crate::error::BuildError;
use crate::selector::{expand, BuildProfile};

/// Copies the archive matching `*-<suffix>.zip` at the project root to
/// `<static_resource_dir>/<resource>.resource`.
pub async fn static_resource(config: &BuildConfig, suffix: &str) -> Result<PathBuf, BuildError> {
    let pattern = format!("*-{suffix}.zip");
    let mut matches = expand(&config.project_root, &[pattern.clone()])?;
    let archive = match matches.pop() {
        Some(path) => path,
        None => return Err(BuildError::MissingArchive(pattern)),
    };
    if !matches.is_empty() {
        warn!(
            chosen = %archive.display(),
            others = matches.len(),
            "Several archives match, using the last one"
        );
    }

    let dest_dir = config.project_root.join(&config.static_resource_dir);
    tokio::fs::create_dir_all(&dest_dir)
        .await
        .map_err(|e| BuildError::io(&dest_dir, e))?;
    let dest = dest_dir.join(config.resource_file_name());
    tokio::fs::copy(&archive, &dest)
        .await
        .map_err(|e| BuildError::io(&archive, e))?;

    info!(
        archive = %archive.display(),
        resource = %dest.display(),
        "Packaged archive as static resource"
    );
    Ok(dest)
}

/// Static resource from the release archive of `profile`.
pub async fn static_resource_min(
    config: &BuildConfig,
    profile: &BuildProfile,
) -> Result<PathBuf, BuildError> {
    let suffix = format!("{}-{}", profile.fingerprint(), profile.build_type());
    static_resource(config, &suffix).await
}

pub async fn static_resource_dev(config: &BuildConfig) -> Result<PathBuf, BuildError> {
    static_resource(config, BuildType::Dev.label()).await
}

async fn remove_matching(config: &BuildConfig, pattern: String) -> Result<usize, BuildError> {
    let files = expand(&config.project_root, &[pattern])?;
    for file in &files {
        tokio::fs::remove_file(file)
            .await
            .map_err(|e| BuildError::io(file, e))?;
        info!(path = %file.display(), "Removed old build output");
    }
    Ok(files.len())
}

/// Removes `*-min*-<build_type>.zip` archives at the project root.
pub async fn clean_min(config: &BuildConfig, build_type: BuildType) -> Result<usize, BuildError> {
    remove_matching(config, format!("*-min*-{build_type}.zip")).await
}

/// Removes `*-dev.zip` archives and the unpacked dev bundle.
pub async fn clean_dev(config: &BuildConfig) -> Result<usize, BuildError> {
    let mut removed = remove_matching(config, "*-dev.zip".to_string()).await?;
    let bundle = config.dev_bundle_path();
    if bundle.exists() {
        tokio::fs::remove_dir_all(&bundle)
            .await
            .map_err(|e| BuildError::io(&bundle, e))?;
        info!(path = %bundle.display(), "Removed unpacked dev bundle");
        removed += 1;
    }
    Ok(removed)
}
