use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Which transform chain of the packaging pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Script,
    Style,
    Config,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Script => f.write_str("script"),
            Step::Style => f.write_str("style"),
            Step::Config => f.write_str("config"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("lint failed: {} problem(s) found", .0.len())]
    LintFailure(Vec<String>),

    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    #[error("invalid value `{value}` for `{argument}` (expected one of: {expected})")]
    InvalidArgument {
        argument: &'static str,
        value: String,
        expected: String,
    },

    #[error("{0} environment variables not found")]
    UnresolvedEnvironment(String),

    #[error("{step} step failed for {}: {message}", path.display())]
    PipelineStep {
        step: Step,
        path: PathBuf,
        message: String,
    },

    #[error("no archive matching `{0}` found; run the build first")]
    MissingArchive(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid glob pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("remote deployment failed: {0}")]
    RemoteDeploy(String),

    #[error("remote deployment did not finish within {0:?}")]
    DeployTimeout(Duration),

    #[error("unknown task `{0}`")]
    UnknownTask(String),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn step(step: Step, path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        BuildError::PipelineStep {
            step,
            path: path.into(),
            message: message.to_string(),
        }
    }
}
