//! Resolves a deployment target's credentials from `.env` and the process environment.

use std::path::Path;
use tracing::{info, warn};

use crate::contract::Credentials;
use crate::error::BuildError;

/// Loads `<project_root>/.env` when present. Values already set in the process win.
///
/// Returns whether the file was found.
pub fn load_env_file(project_root: &Path) -> bool {
    let path = project_root.join(".env");
    if !path.is_file() {
        info!(path = %path.display(), "Couldn't find .env file");
        return false;
    }
    info!(path = %path.display(), "Discovered .env file");
    if let Err(e) = dotenvy::from_path(&path) {
        warn!(error = ?e, path = %path.display(), "Failed to load .env file");
    }
    true
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// `true` when both `<PREFIX>_USERNAME` and `<PREFIX>_PASSWORD` are set and non-empty.
pub fn has_credentials(prefix: &str) -> bool {
    non_empty_var(&format!("{prefix}_USERNAME")).is_some()
        && non_empty_var(&format!("{prefix}_PASSWORD")).is_some()
}

/// Loads `.env` if present, then checks for the target's credentials.
pub fn check_environment(project_root: &Path, prefix: &str) -> bool {
    load_env_file(project_root);
    let valid = has_credentials(prefix);
    if valid {
        info!(target_prefix = prefix, "Found deployment config");
    } else {
        warn!(target_prefix = prefix, "Deployment config not found");
    }
    valid
}

/// Like [`check_environment`], but missing credentials are an error naming the prefix.
pub fn require_environment(project_root: &Path, prefix: &str) -> Result<(), BuildError> {
    if check_environment(project_root, prefix) {
        Ok(())
    } else {
        Err(BuildError::UnresolvedEnvironment(prefix.to_string()))
    }
}

/// Builds [`Credentials`] for `prefix` from the process environment.
pub fn resolve_credentials(prefix: &str) -> Result<Credentials, BuildError> {
    let username = non_empty_var(&format!("{prefix}_USERNAME"));
    let password = non_empty_var(&format!("{prefix}_PASSWORD"));
    match (username, password) {
        (Some(username), Some(password)) => {
            let mut credentials = Credentials::new(username, password);
            credentials.login_url = non_empty_var(&format!("{prefix}_LOGIN_URL"));
            info!(
                target_prefix = prefix,
                login_url = credentials.login_url(),
                "Resolved deployment credentials"
            );
            Ok(credentials)
        }
        _ => Err(BuildError::UnresolvedEnvironment(prefix.to_string())),
    }
}
