use plugforge_manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while discovering, validating, or compiling plugins
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to read plugin directory {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    #[error("Invalid match pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("'{0}' build target is not supported")]
    UnsupportedTarget(String),

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command failed: {command} ({status})")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        output: String,
    },

    #[error("Command timed out after {}s: {command}", .timeout.as_secs())]
    Timeout {
        command: String,
        timeout: Duration,
        output: String,
    },

    #[error("Failed to decode plugin descriptor from {path}: {source}")]
    Descriptor {
        path: PathBuf,
        output: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("plugin '{name}' must implement test")]
    MissingTests { name: String, path: PathBuf },

    #[error("plugin '{name}' requires a README.md file")]
    MissingReadme { name: String, path: PathBuf },

    #[error("plugin '{name}' in {path} is already provided by {existing}")]
    DuplicatePlugin {
        name: String,
        path: PathBuf,
        existing: PathBuf,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl BuildError {
    /// Raw subprocess output attached to this error, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            BuildError::CommandFailed { output, .. }
            | BuildError::Timeout { output, .. }
            | BuildError::Descriptor { output, .. } => Some(output.as_str()),
            _ => None,
        }
    }
}

/// A unit of work that failed inside the pool
#[derive(Error, Debug)]
#[error("{id} - building plugin {source_dir:?} failed - {error}")]
pub struct WorkerFailure {
    pub id: &'static str,
    pub source_dir: PathBuf,
    #[source]
    pub error: BuildError,
}

/// Errors surfaced by the worker pool as a whole
#[derive(Error, Debug)]
pub enum PoolError {
    #[error(transparent)]
    Worker(#[from] WorkerFailure),

    #[error("Failed to start worker pool: {0}")]
    Start(String),

    #[error("Worker pool stopped after {received} of {expected} plugins")]
    Incomplete { expected: usize, received: usize },
}
