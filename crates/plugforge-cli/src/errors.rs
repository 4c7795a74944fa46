//! Errors surfaced by the command layer

use plugforge_build::{BuildError, PoolError};
use plugforge_config::ConfigError;
use plugforge_manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("--version is required")]
    MissingVersion,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    /// Subprocess output to echo before exiting, if the failure carries any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            CompileError::Build(err) => err.captured_output(),
            CompileError::Pool(PoolError::Worker(failure)) => failure.error.captured_output(),
            _ => None,
        }
    }

    /// Worker id responsible for the failure
    pub fn worker_id(&self) -> Option<&'static str> {
        match self {
            CompileError::Pool(PoolError::Worker(failure)) => Some(failure.id),
            _ => None,
        }
    }
}
