use anyhow::Result;
use resource_bundler_core::config::BuildConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Default config file name, looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "bundle.yaml";

/// On-disk shape of `bundle.yaml`. Every field is optional; missing ones keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    #[serde(default)]
    project_root: Option<PathBuf>,
    #[serde(default)]
    components_dir: Option<PathBuf>,
    #[serde(default)]
    resource_name: Option<String>,
    #[serde(default)]
    release_components: Option<Vec<String>>,
    #[serde(default)]
    dev_target: Option<String>,
    #[serde(default)]
    clients: Option<Vec<String>>,
    #[serde(default)]
    static_resource_dir: Option<PathBuf>,
    #[serde(default)]
    deploy_source_dir: Option<PathBuf>,
    #[serde(default)]
    bundle_dir: Option<PathBuf>,
}

impl StaticConfig {
    fn into_build_config(self, base: &Path) -> BuildConfig {
        let project_root = match self.project_root {
            Some(root) if root.is_absolute() => root,
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        };
        let mut config = BuildConfig::new(project_root);
        if let Some(components) = self.release_components {
            config = config.with_release_components(components);
        }
        if let Some(dir) = self.components_dir {
            config.components_dir = dir;
        }
        if let Some(name) = self.resource_name {
            config.resource_name = name;
        }
        if let Some(target) = self.dev_target {
            config.dev_target = target;
        }
        if let Some(clients) = self.clients {
            config.clients = clients;
        }
        if let Some(dir) = self.static_resource_dir {
            config.static_resource_dir = dir;
        }
        if let Some(dir) = self.deploy_source_dir {
            config.deploy_source_dir = dir;
        }
        if let Some(dir) = self.bundle_dir {
            config.bundle_dir = dir;
        }
        config
    }
}

/// Loads a YAML build config. A relative `project_root` inside the file is resolved against
/// the file's own directory; without one, that directory is the project root.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BuildConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid "all defaults" config.
    let static_conf: StaticConfig = if config_content.trim().is_empty() {
        StaticConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let base = match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let config = static_conf.into_build_config(&base);
    config.trace_loaded();
    Ok(config)
}

/// Resolves the configuration for a CLI invocation.
///
/// An explicit `--config` must exist. Otherwise `bundle.yaml` in the project root is used when
/// present, and plain defaults when not. `--root` always wins over the file's `project_root`.
pub fn resolve_config(config: Option<&Path>, root: Option<&Path>) -> Result<BuildConfig> {
    let mut build_config = match config {
        Some(path) => load_config(path)?,
        None => {
            let base = root.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
            let candidate = base.join(DEFAULT_CONFIG_FILE);
            if candidate.is_file() {
                load_config(&candidate)?
            } else {
                info!(
                    config_path = ?candidate,
                    "No config file found, using default configuration"
                );
                let config = BuildConfig::new(base);
                config.trace_loaded();
                config
            }
        }
    };
    if let Some(root) = root {
        build_config.project_root = root.to_path_buf();
    }
    Ok(build_config)
}
