//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Config file not found: {0}. Expected 'modforge.toml' in the source root.")]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: task '{required_by}' requires unknown task '{name}'. Available tasks: {available}")]
    MissingPrerequisite {
        name: String,
        required_by: String,
        available: String,
    },

    #[error("Configuration error: circular task dependency involving '{0}'")]
    CircularDependency(String),

    #[error("Configuration error: task '{0}' is declared more than once")]
    DuplicateTask(String),

    #[error("Unknown task: {name}. Available tasks: {available}")]
    TaskNotFound { name: String, available: String },

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Tool invocation failed for {gate}: {message}")]
    ToolInvocation { gate: String, message: String },

    #[error("Quality gate '{gate}' failed:\n{report}")]
    QualityGate { gate: String, report: String },

    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("Spec metadata not found in {}: {message}", path.display())]
    SpecNotFound { path: PathBuf, message: String },

    #[error("Manifest error in {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Metadata synchronization failed: {}", join_errors(failures))]
    Sync { failures: Vec<Error> },

    #[error("Package source error: {0}")]
    PackageSource(String),

    #[error("Invalid version {version}: {message}")]
    InvalidVersion { version: String, message: String },

    #[error("Build context error: {0}")]
    ContextState(String),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Returns `true` for errors raised while validating the task graph.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::MissingPrerequisite { .. }
                | Error::CircularDependency(_)
                | Error::DuplicateTask(_)
        )
    }

    /// Returns the name of the task that failed, if this error came from a task body.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            Error::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Toml {
            error,
            context: "modforge.toml".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
