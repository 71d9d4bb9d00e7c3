//! # resource-bundler CLI
//!
//! Parses arguments, resolves the [`BuildConfig`] and hands the requested entry point to the
//! core [`TaskRunner`]. Each subcommand maps to one task of the graph; upstream tasks run
//! first. `deploy-<client>` and `env-<prefix>` are accepted as free-form subcommands and
//! checked against the configured targets.
//!
//! [`BuildConfig`]: resource_bundler_core::config::BuildConfig
//! [`TaskRunner`]: resource_bundler_core::tasks::TaskRunner

use crate::load_config::resolve_config;
use crate::metadata_client::MetadataClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use resource_bundler_core::config::BuildConfig;
use resource_bundler_core::tasks::{Task, TaskRunner};
use std::path::PathBuf;

/// Build, package and deploy platform UI components.
#[derive(Parser)]
#[clap(
    name = "resource-bundler",
    version,
    about = "Lint, bundle and deploy UI components as a platform static resource"
)]
pub struct Cli {
    /// Path to the YAML config file (defaults to `bundle.yaml` in the project root)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root; overrides `project_root` from the config file
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every task with its upstream dependencies
    Tasks,
    /// Check component scripts for syntax errors
    Lint,
    /// Build the minified release archive
    Build,
    /// Build the unminified dev bundle and archive
    BuildDev,
    /// Build a minified archive for a single component
    BuildInteractive {
        /// Component selector: timer, template, pI or ppC
        #[clap(short = 'c', long)]
        component: Option<String>,
    },
    /// Copy the release archive into the static resource folder
    StaticResource,
    /// Copy the dev archive into the static resource folder
    StaticResourceDev,
    /// Remove previous release archives
    Clean,
    /// Remove previous dev archives and the unpacked bundle
    CleanDev,
    /// Check that credentials for a target prefix are available
    Env {
        /// Environment variable prefix, e.g. `Company`
        target: String,
    },
    /// Deploy to the default destination
    Deploy,
    /// Build the dev bundle and deploy it to the dev org
    DeployDev,
    /// `deploy-<client>` or `env-<prefix>`
    #[clap(external_subcommand)]
    External(Vec<String>),
}

impl Commands {
    /// Task for this command, or `None` for commands that only report.
    fn task(&self, config: &BuildConfig) -> Result<Option<Task>> {
        let task = match self {
            Commands::Tasks => return Ok(None),
            Commands::Lint => Task::Lint,
            Commands::Build => Task::BuildRelease,
            Commands::BuildDev => Task::BuildDev,
            Commands::BuildInteractive { component } => Task::interactive(component.as_deref())?,
            Commands::StaticResource => Task::StaticResourceRelease,
            Commands::StaticResourceDev => Task::StaticResourceDev,
            Commands::Clean => Task::CleanRelease,
            Commands::CleanDev => Task::CleanDev,
            Commands::Env { target } => Task::Env(target.clone()),
            Commands::Deploy => Task::Deploy,
            Commands::DeployDev => Task::DeployDev,
            Commands::External(args) => {
                let Some((name, rest)) = args.split_first() else {
                    return Err(anyhow::anyhow!("missing task name"));
                };
                if !rest.is_empty() {
                    tracing::warn!(task = %name, ignored = ?rest, "Ignoring extra arguments");
                }
                Task::from_name(name, config)?
            }
        };
        Ok(Some(task))
    }
}

fn print_catalog(config: &BuildConfig) {
    for task in Task::catalog(config) {
        let deps: Vec<String> = task
            .dependencies(config)
            .iter()
            .map(Task::name)
            .collect();
        if deps.is_empty() {
            println!("{}", task.name());
        } else {
            println!("{:<32} <- {}", task.name(), deps.join(", "));
        }
    }
    println!("{:<32} <- clean-min-release", "build-interactive -c <component>");
}

/// Async entry point shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = resolve_config(cli.config.as_deref(), cli.root.as_deref())?;

    // Selector and task-name errors surface here, before anything touches the filesystem.
    let Some(task) = cli.command.task(&config)? else {
        print_catalog(&config);
        return Ok(());
    };

    tracing::info!(task = %task, "Running task");
    let runner = TaskRunner::new(config, MetadataClient::new());
    match runner.run(&task).await {
        Ok(report) => {
            tracing::info!(task = %task, completed = ?report.completed, "Task complete");
            println!("{} complete ({})", task, report.completed.join(" -> "));
            Ok(())
        }
        Err(e) => {
            tracing::error!(task = %task, error = %e, "Task failed");
            Err(anyhow::Error::new(e))
        }
    }
}
