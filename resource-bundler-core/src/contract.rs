//! # contract: interface to the remote deployment service
//!
//! This module defines the [`Deployer`] trait and the plain data types that flow through it.
//! The orchestration in [`crate::deploy`] only talks to the trait, so the real SOAP client
//! (in the CLI crate) and `mockall` mocks in tests are interchangeable.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; enable the `test-export-mocks` feature (on by
//!   default) to use `MockDeployer` from other crates.
//!
//! ## Adding New Deployment Destinations
//! - Implement the trait for your destination.
//! - Convert transport errors into a boxed [`DeployError`]; do not panic.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
pub const API_VERSION: &str = "37.0";
pub const POLL_TIMEOUT: Duration = Duration::from_secs(120);
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Error type for Deployer implementations (simple boxed error).
pub type DeployError = Box<dyn std::error::Error + Send + Sync>;

/// Login data and fixed deployment settings for one target org.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Overrides [`DEFAULT_LOGIN_URL`] when set (e.g. `https://test.salesforce.com`).
    pub login_url: Option<String>,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub api_version: String,
    pub rollback_on_error: bool,
    pub verbose: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
            login_url: None,
            poll_timeout: POLL_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            api_version: API_VERSION.to_string(),
            rollback_on_error: true,
            verbose: false,
        }
    }

    pub fn login_url(&self) -> &str {
        self.login_url.as_deref().unwrap_or(DEFAULT_LOGIN_URL)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_url", &self.login_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("api_version", &self.api_version)
            .field("rollback_on_error", &self.rollback_on_error)
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Authenticated session returned by [`Deployer::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    /// Endpoint for metadata calls (`.../services/Soap/m/<version>/<org>`).
    pub metadata_server_url: String,
}

/// Options sent with a deploy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub rollback_on_error: bool,
    pub single_package: bool,
    pub check_only: bool,
}

impl From<&Credentials> for DeployOptions {
    fn from(credentials: &Credentials) -> Self {
        DeployOptions {
            rollback_on_error: credentials.rollback_on_error,
            single_package: false,
            check_only: false,
        }
    }
}

/// Snapshot of a running or finished deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployStatus {
    pub id: String,
    pub done: bool,
    pub success: bool,
    /// Remote state, e.g. `Queued`, `InProgress`, `Succeeded`, `Failed`.
    pub status: String,
    pub components_deployed: u32,
    pub components_total: u32,
    /// Component failures and the top-level error message, if any.
    pub errors: Vec<String>,
}

/// Trait for pushing a zipped metadata package to a remote org.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Authenticate and obtain a session for metadata calls.
    async fn login(&self, credentials: &Credentials) -> Result<Session, DeployError>;

    /// Submit a zipped package. Returns the async process id to poll.
    async fn deploy(
        &self,
        session: &Session,
        zip_file: Vec<u8>,
        options: &DeployOptions,
    ) -> Result<String, DeployError>;

    /// Fetch the current status of a submitted deployment.
    async fn check_deploy_status(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<DeployStatus, DeployError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("user@example.com", "hunter2");
        let shown = format!("{creds:?}");
        assert!(shown.contains("user@example.com"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn credentials_use_fixed_deploy_settings() {
        let creds = Credentials::new("u", "p");
        assert_eq!(creds.poll_timeout, Duration::from_secs(120));
        assert_eq!(creds.poll_interval, Duration::from_secs(2));
        assert_eq!(creds.api_version, "37.0");
        assert!(creds.rollback_on_error);
        assert!(!creds.verbose);
        assert_eq!(creds.login_url(), DEFAULT_LOGIN_URL);
    }
}
