//! Distribution gate: every plugin ships with tests and a README

use plugforge_manifest::PluginDescriptor;
use std::path::{Path, PathBuf};

use crate::errors::BuildError;

pub const TEST_DIR_NAME: &str = "test";
pub const README_FILE_NAME: &str = "README.md";

/// A plugin whose descriptor has been read and whose layout passed validation
#[derive(Debug, Clone)]
pub struct CompiledPlugin {
    pub descriptor: PluginDescriptor,
    pub source_dir: PathBuf,
    pub test_dir: PathBuf,
    pub doc_path: PathBuf,
    pub worker_id: &'static str,
}

impl CompiledPlugin {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Check `source_dir` for a `test` directory and a `README.md` file.
pub fn validate(
    descriptor: PluginDescriptor,
    source_dir: &Path,
    worker_id: &'static str,
) -> Result<CompiledPlugin, BuildError> {
    let test_dir = source_dir.join(TEST_DIR_NAME);
    if !test_dir.is_dir() {
        return Err(BuildError::MissingTests {
            name: descriptor.name,
            path: test_dir,
        });
    }

    let doc_path = source_dir.join(README_FILE_NAME);
    if !doc_path.is_file() {
        return Err(BuildError::MissingReadme {
            name: descriptor.name,
            path: doc_path,
        });
    }

    Ok(CompiledPlugin {
        descriptor,
        source_dir: source_dir.to_path_buf(),
        test_dir,
        doc_path,
        worker_id,
    })
}
