//! Deployment orchestration: archive → login → submit → poll.
//!
//! Talks only to the [`Deployer`] trait. Polls every `poll_interval` until the remote
//! reports completion or `poll_timeout` elapses. There is no retry; rollback of a failed
//! deployment is left to the remote `rollbackOnError` option.

use std::time::Instant;
use tracing::{error, info};

use crate::archive::archive_directory;
use crate::config::BuildConfig;
use crate::contract::{Credentials, DeployOptions, DeployStatus, Deployer};
use crate::error::BuildError;

/// Outcome of a finished, successful deployment.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub id: String,
    pub status: String,
    pub components_deployed: u32,
    pub polls: u32,
}

/// Submits `package` (zip bytes) and waits for the remote deployment to finish.
pub async fn deploy_package<D>(
    deployer: &D,
    credentials: &Credentials,
    package: Vec<u8>,
) -> Result<DeployReport, BuildError>
where
    D: Deployer + ?Sized,
{
    info!(
        username = %credentials.username,
        login_url = credentials.login_url(),
        bytes = package.len(),
        "[DEPLOY] Logging in"
    );
    let session = deployer.login(credentials).await.map_err(|e| {
        error!(error = ?e, "[DEPLOY][ERROR] Login failed");
        BuildError::RemoteDeploy(format!("login failed: {e}"))
    })?;

    let options = DeployOptions::from(credentials);
    let id = deployer
        .deploy(&session, package, &options)
        .await
        .map_err(|e| {
            error!(error = ?e, "[DEPLOY][ERROR] Deploy request failed");
            BuildError::RemoteDeploy(format!("deploy request failed: {e}"))
        })?;
    info!(deploy_id = %id, "[DEPLOY] Package submitted");

    let started = Instant::now();
    let mut polls = 0;
    loop {
        let status: DeployStatus = deployer
            .check_deploy_status(&session, &id)
            .await
            .map_err(|e| {
                error!(error = ?e, deploy_id = %id, "[DEPLOY][ERROR] Status check failed");
                BuildError::RemoteDeploy(format!("status check failed: {e}"))
            })?;
        polls += 1;
        info!(
            deploy_id = %id,
            status = %status.status,
            deployed = status.components_deployed,
            total = status.components_total,
            "[DEPLOY] Polled deployment status"
        );

        if status.done {
            if status.success {
                info!(deploy_id = %id, "[DEPLOY] Deployment succeeded");
                return Ok(DeployReport {
                    id,
                    status: status.status,
                    components_deployed: status.components_deployed,
                    polls,
                });
            }
            error!(deploy_id = %id, errors = ?status.errors, "[DEPLOY][ERROR] Deployment failed");
            let detail = if status.errors.is_empty() {
                status.status
            } else {
                status.errors.join("; ")
            };
            return Err(BuildError::RemoteDeploy(detail));
        }

        if started.elapsed() >= credentials.poll_timeout {
            error!(deploy_id = %id, "[DEPLOY][ERROR] Polling timed out");
            return Err(BuildError::DeployTimeout(credentials.poll_timeout));
        }
        tokio::time::sleep(credentials.poll_interval).await;
    }
}

/// Archives the project's deploy source tree (`src/**`) and deploys it.
pub async fn deploy_directory<D>(
    deployer: &D,
    config: &BuildConfig,
    credentials: &Credentials,
) -> Result<DeployReport, BuildError>
where
    D: Deployer + ?Sized,
{
    let package = archive_directory(&config.project_root, &config.deploy_source_dir)?;
    deploy_package(deployer, credentials, package).await
}
