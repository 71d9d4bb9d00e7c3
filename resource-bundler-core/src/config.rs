use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::BuildError;
use crate::selector::BuildProfile;

pub const DEFAULT_COMPONENTS_DIR: &str = "components";
pub const DEFAULT_RESOURCE_NAME: &str = "CompanyComponents";
pub const DEFAULT_STATIC_RESOURCE_DIR: &str = "src/staticresources";
pub const DEFAULT_DEPLOY_SOURCE_DIR: &str = "src";
pub const DEFAULT_BUNDLE_DIR: &str = "resource-bundles";
pub const DEFAULT_DEV_TARGET: &str = "Company";
pub const DEFAULT_CLIENT_TARGETS: &[&str] = &["CLIENT_ORG"];
pub const DEFAULT_RELEASE_COMPONENTS: &[&str] = &[
    "progressIndicator",
    "timer",
    "template",
    "modelRegisterer",
    "modelRefresher",
];

/// Kind of build. The lowercase label ends up in archive names and exclusion markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Release,
    Dev,
    Custom,
}

impl BuildType {
    pub fn label(&self) -> &'static str {
        match self {
            BuildType::Release => "release",
            BuildType::Dev => "dev",
            BuildType::Custom => "custom",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `author` in package.json is either a plain string or a person object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Person {
        name: String,
        #[serde(default)]
        email: Option<String>,
    },
}

impl Default for Author {
    fn default() -> Self {
        Author::Name(String::new())
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::Name(name) => f.write_str(name),
            Author::Person {
                name,
                email: Some(email),
            } => write!(f, "{name} <{email}>"),
            Author::Person { name, email: None } => f.write_str(name),
        }
    }
}

/// Package metadata stamped into the bundle header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub author: Author,
}

impl PackageMetadata {
    /// Reads `package.json` from the project root.
    pub fn load(project_root: &Path) -> Result<Self, BuildError> {
        let path = project_root.join("package.json");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read package.json");
            BuildError::io(&path, e)
        })?;
        let metadata: PackageMetadata = serde_json::from_str(&content).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to parse package.json");
            BuildError::Config(format!("invalid package.json: {e}"))
        })?;
        info!(
            name = %metadata.name,
            version = %metadata.version,
            "Loaded package metadata"
        );
        Ok(metadata)
    }
}

/// Everything a build or deploy needs, constructed once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub project_root: PathBuf,
    pub components_dir: PathBuf,
    pub resource_name: String,
    pub release: BuildProfile,
    pub dev_target: String,
    pub clients: Vec<String>,
    pub static_resource_dir: PathBuf,
    pub deploy_source_dir: PathBuf,
    pub bundle_dir: PathBuf,
}

impl BuildConfig {
    /// Configuration with every default applied, rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let release = BuildProfile::release(
            DEFAULT_RELEASE_COMPONENTS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        BuildConfig {
            project_root: project_root.into(),
            components_dir: PathBuf::from(DEFAULT_COMPONENTS_DIR),
            resource_name: DEFAULT_RESOURCE_NAME.to_string(),
            release,
            dev_target: DEFAULT_DEV_TARGET.to_string(),
            clients: DEFAULT_CLIENT_TARGETS.iter().map(|c| c.to_string()).collect(),
            static_resource_dir: PathBuf::from(DEFAULT_STATIC_RESOURCE_DIR),
            deploy_source_dir: PathBuf::from(DEFAULT_DEPLOY_SOURCE_DIR),
            bundle_dir: PathBuf::from(DEFAULT_BUNDLE_DIR),
        }
    }

    pub fn with_release_components(mut self, components: Vec<String>) -> Self {
        self.release = BuildProfile::release(components);
        self
    }

    pub fn components_root(&self) -> PathBuf {
        self.project_root.join(&self.components_dir)
    }

    /// Archive name for a minified build: `<resource>-min-<fingerprint>-<type>.zip`.
    pub fn min_archive_name(&self, profile: &BuildProfile) -> String {
        format!(
            "{}-min-{}-{}.zip",
            self.resource_name,
            profile.fingerprint(),
            profile.build_type()
        )
    }

    pub fn dev_archive_name(&self) -> String {
        format!("{}-{}.zip", self.resource_name, BuildType::Dev)
    }

    /// File name of the static resource inside the platform package.
    pub fn resource_file_name(&self) -> String {
        format!("{}.resource", self.resource_name)
    }

    /// Unpacked dev bundle directory, e.g. `resource-bundles/CompanyComponents.resource`.
    pub fn dev_bundle_path(&self) -> PathBuf {
        self.project_root
            .join(&self.bundle_dir)
            .join(self.resource_file_name())
    }

    pub fn trace_loaded(&self) {
        info!(
            project_root = %self.project_root.display(),
            resource_name = %self.resource_name,
            release_fingerprint = %self.release.fingerprint(),
            clients = self.clients.len(),
            "Loaded BuildConfig"
        );
        debug!(?self, "BuildConfig loaded (full debug)");
    }
}
