use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while assembling or persisting manifests
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Plugin '{0}' is already listed in the manifest")]
    DuplicateEntry(String),
}
