//! Artifact selection: turns a build profile into the glob patterns of its sources.
//!
//! Release builds use the configured component list. Interactive builds take one
//! [`ComponentSelector`] from a fixed vocabulary; anything else is rejected before the
//! filesystem is touched.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::{BuildConfig, BuildType};
use crate::error::BuildError;
use crate::fingerprint::fingerprint;

/// Component selector accepted by the interactive build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentSelector {
    Timer,
    Template,
    ProgressIndicator,
    PopupController,
}

impl ComponentSelector {
    pub const ALL: [ComponentSelector; 4] = [
        ComponentSelector::Timer,
        ComponentSelector::Template,
        ComponentSelector::ProgressIndicator,
        ComponentSelector::PopupController,
    ];

    /// Token typed on the command line.
    pub fn token(&self) -> &'static str {
        match self {
            ComponentSelector::Timer => "timer",
            ComponentSelector::Template => "template",
            ComponentSelector::ProgressIndicator => "pI",
            ComponentSelector::PopupController => "ppC",
        }
    }

    /// Full component name the selector stands for.
    pub fn component_name(&self) -> &'static str {
        match self {
            ComponentSelector::Timer => "timer",
            ComponentSelector::Template => "template",
            ComponentSelector::ProgressIndicator => "progressIndicator",
            ComponentSelector::PopupController => "popupController",
        }
    }

    /// Parses an optional command-line value, failing fast when absent or unknown.
    pub fn parse(value: Option<&str>) -> Result<Self, BuildError> {
        match value {
            None => Err(BuildError::MissingArgument("component")),
            Some(v) if v.trim().is_empty() => Err(BuildError::MissingArgument("component")),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for ComponentSelector {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentSelector::ALL
            .into_iter()
            .find(|sel| sel.token() == s)
            .ok_or_else(|| BuildError::InvalidArgument {
                argument: "component",
                value: s.to_string(),
                expected: ComponentSelector::ALL
                    .iter()
                    .map(|sel| sel.token())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl fmt::Display for ComponentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A named selection of components for one packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProfile {
    build_type: BuildType,
    components: Vec<String>,
    fingerprint: String,
}

impl BuildProfile {
    pub fn new(build_type: BuildType, components: Vec<String>) -> Self {
        let mut seen = BTreeSet::new();
        let components: Vec<String> = components
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();
        let fingerprint = fingerprint(&components);
        BuildProfile {
            build_type,
            components,
            fingerprint,
        }
    }

    pub fn release(components: Vec<String>) -> Self {
        Self::new(BuildType::Release, components)
    }

    pub fn custom(selector: ComponentSelector) -> Self {
        Self::new(
            BuildType::Custom,
            vec![selector.component_name().to_string()],
        )
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Glob patterns (relative to the project root) for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    pub components: Vec<String>,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub configs: Vec<String>,
}

pub fn select(config: &BuildConfig, profile: &BuildProfile) -> SourceSelection {
    let dir = pattern_prefix(&config.components_dir);
    let mut scripts = Vec::new();
    let mut styles = Vec::new();
    for component in profile.components() {
        scripts.push(format!("{dir}/*_{component}/*.js"));
        styles.push(format!("{dir}/*_{component}/*.css"));
    }
    let selection = SourceSelection {
        components: profile.components().to_vec(),
        scripts,
        styles,
        configs: vec![format!("{dir}/skuid_*.json")],
    };
    info!(
        build_type = %profile.build_type(),
        components = ?selection.components,
        "Selected component sources"
    );
    selection
}

fn pattern_prefix(dir: &Path) -> String {
    dir.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Expands root-relative glob patterns into a sorted, de-duplicated file list.
pub fn expand(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, BuildError> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
        let paths = glob::glob(&full).map_err(|e| BuildError::Pattern {
            pattern: full.clone(),
            message: e.to_string(),
        })?;
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                BuildError::io(path, std::io::Error::from(e))
            })?;
            if path.is_file() {
                files.insert(path);
            }
        }
    }
    debug!(count = files.len(), ?patterns, "Expanded source patterns");
    Ok(files.into_iter().collect())
}
