//! Task graph: named entry points and their upstream dependencies.
//!
//! A requested task is resolved into a de-duplicated topological order (every task runs at
//! most once per invocation) and executed sequentially, so no task starts before all of
//! its upstream tasks have completed. The first failure stops the run.

use std::collections::HashSet;
use std::fmt;
use tracing::{error, info};

use crate::config::{BuildConfig, BuildType, PackageMetadata};
use crate::contract::Deployer;
use crate::deploy::deploy_directory;
use crate::environment::{require_environment, resolve_credentials};
use crate::error::BuildError;
use crate::lint::lint;
use crate::pipeline::{build_dev, build_min};
use crate::resource::{clean_dev, clean_min, static_resource_dev, static_resource_min};
use crate::selector::{BuildProfile, ComponentSelector};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Task {
    Lint,
    CleanRelease,
    BuildRelease,
    BuildInteractive(ComponentSelector),
    StaticResourceRelease,
    CleanDev,
    BuildDev,
    StaticResourceDev,
    /// Credential check for a target prefix.
    Env(String),
    DeployDev,
    /// Release deployment to a configured client target prefix.
    DeployClient(String),
    /// Default deployment entry point.
    Deploy,
}

impl Task {
    pub fn name(&self) -> String {
        match self {
            Task::Lint => "lint".into(),
            Task::CleanRelease => "clean-min-release".into(),
            Task::BuildRelease => "build-min-release".into(),
            Task::BuildInteractive(sel) => format!("build-interactive --component {sel}"),
            Task::StaticResourceRelease => "static-resource-min-release".into(),
            Task::CleanDev => "clean-dev".into(),
            Task::BuildDev => "build-dev".into(),
            Task::StaticResourceDev => "static-resource-dev".into(),
            Task::Env(prefix) => format!("env-{prefix}"),
            Task::DeployDev => "deploy-dev".into(),
            Task::DeployClient(prefix) => format!("deploy-{prefix}"),
            Task::Deploy => "deploy".into(),
        }
    }

    /// Upstream tasks that must complete first.
    pub fn dependencies(&self, config: &BuildConfig) -> Vec<Task> {
        match self {
            Task::Lint | Task::CleanDev | Task::Env(_) => vec![],
            Task::CleanRelease => vec![Task::Lint],
            Task::BuildRelease | Task::BuildInteractive(_) => vec![Task::CleanRelease],
            Task::StaticResourceRelease => vec![Task::BuildRelease],
            Task::BuildDev => vec![Task::CleanDev, Task::Lint],
            Task::StaticResourceDev => vec![Task::BuildDev],
            Task::DeployDev => vec![
                Task::StaticResourceDev,
                Task::Env(config.dev_target.clone()),
            ],
            Task::DeployClient(prefix) => vec![
                Task::StaticResourceRelease,
                Task::Env(prefix.clone()),
            ],
            Task::Deploy => vec![Task::DeployDev],
        }
    }

    /// Resolves a task name typed on the command line.
    ///
    /// `build-interactive` needs a selector and is built with [`Task::interactive`] instead.
    pub fn from_name(name: &str, config: &BuildConfig) -> Result<Task, BuildError> {
        let task = match name {
            "lint" => Task::Lint,
            "clean" | "clean-min-release" => Task::CleanRelease,
            "build" | "build-min-release" => Task::BuildRelease,
            "static-resource" | "static-resource-min-release" => Task::StaticResourceRelease,
            "clean-dev" => Task::CleanDev,
            "build-dev" => Task::BuildDev,
            "static-resource-dev" => Task::StaticResourceDev,
            "deploy-dev" => Task::DeployDev,
            "deploy" => Task::Deploy,
            "build-interactive" => return Err(BuildError::MissingArgument("component")),
            other => {
                if let Some(prefix) = other.strip_prefix("deploy-") {
                    if config.clients.iter().any(|c| c == prefix) {
                        Task::DeployClient(prefix.to_string())
                    } else {
                        return Err(BuildError::UnknownTask(other.to_string()));
                    }
                } else if let Some(prefix) = other.strip_prefix("env-") {
                    if prefix.is_empty() {
                        return Err(BuildError::UnknownTask(other.to_string()));
                    }
                    Task::Env(prefix.to_string())
                } else {
                    return Err(BuildError::UnknownTask(other.to_string()));
                }
            }
        };
        Ok(task)
    }

    /// Interactive build task; the selector is validated before anything runs.
    pub fn interactive(selector: Option<&str>) -> Result<Task, BuildError> {
        Ok(Task::BuildInteractive(ComponentSelector::parse(selector)?))
    }

    /// Public entry points for `config`, in display order.
    pub fn catalog(config: &BuildConfig) -> Vec<Task> {
        let mut tasks = vec![
            Task::Lint,
            Task::CleanRelease,
            Task::BuildRelease,
            Task::StaticResourceRelease,
            Task::CleanDev,
            Task::BuildDev,
            Task::StaticResourceDev,
            Task::Env(config.dev_target.clone()),
            Task::DeployDev,
            Task::Deploy,
        ];
        for client in &config.clients {
            tasks.push(Task::Env(client.clone()));
            tasks.push(Task::DeployClient(client.clone()));
        }
        tasks
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Execution order for `task`: dependencies first, each task once.
pub fn plan(task: &Task, config: &BuildConfig) -> Vec<Task> {
    fn visit(task: &Task, config: &BuildConfig, seen: &mut HashSet<Task>, order: &mut Vec<Task>) {
        if seen.contains(task) {
            return;
        }
        seen.insert(task.clone());
        for dep in task.dependencies(config) {
            visit(&dep, config, seen, order);
        }
        order.push(task.clone());
    }

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    visit(task, config, &mut seen, &mut order);
    order
}

/// Names of the tasks that ran, in order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub completed: Vec<String>,
}

/// Runs tasks against one configuration and one deployment client.
pub struct TaskRunner<D> {
    config: BuildConfig,
    deployer: D,
}

impl<D: Deployer> TaskRunner<D> {
    pub fn new(config: BuildConfig, deployer: D) -> Self {
        Self { config, deployer }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Runs `task` after all of its upstream tasks.
    pub async fn run(&self, task: &Task) -> Result<RunReport, BuildError> {
        let order = plan(task, &self.config);
        info!(
            task = %task,
            plan = ?order.iter().map(Task::name).collect::<Vec<_>>(),
            "[TASK] Resolved task plan"
        );

        let mut report = RunReport::default();
        for step in &order {
            info!(task = %step, "[TASK] Starting");
            if let Err(e) = self.execute(step).await {
                error!(task = %step, error = %e, "[TASK][ERROR] Task failed");
                return Err(e);
            }
            info!(task = %step, "[TASK] Finished");
            report.completed.push(step.name());
        }
        Ok(report)
    }

    async fn execute(&self, task: &Task) -> Result<(), BuildError> {
        let config = &self.config;
        match task {
            Task::Lint => {
                lint(config).await?;
            }
            Task::CleanRelease => {
                clean_min(config, BuildType::Release).await?;
            }
            Task::BuildRelease => {
                let metadata = PackageMetadata::load(&config.project_root)?;
                build_min(config, &config.release, &metadata).await?;
            }
            Task::BuildInteractive(selector) => {
                let metadata = PackageMetadata::load(&config.project_root)?;
                build_min(config, &BuildProfile::custom(*selector), &metadata).await?;
            }
            Task::StaticResourceRelease => {
                static_resource_min(config, &config.release).await?;
            }
            Task::CleanDev => {
                clean_dev(config).await?;
            }
            Task::BuildDev => {
                build_dev(config).await?;
            }
            Task::StaticResourceDev => {
                static_resource_dev(config).await?;
            }
            Task::Env(prefix) => require_environment(&config.project_root, prefix)?,
            Task::DeployDev => {
                let credentials = resolve_credentials(&config.dev_target)?;
                deploy_directory(&self.deployer, config, &credentials).await?;
            }
            Task::DeployClient(prefix) => {
                let credentials = resolve_credentials(prefix)?;
                deploy_directory(&self.deployer, config, &credentials).await?;
            }
            Task::Deploy => {
                info!("Done deploying to default destination");
            }
        }
        Ok(())
    }
}
