//! Target matrix compilation
//!
//! Compiles one package once per selected target, writing every binary into
//! a single output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::BuildError;
use crate::target::TargetDefinition;
use crate::toolchain::Toolchain;

pub struct TargetCompiler<'a> {
    toolchain: &'a Toolchain,
    targets: &'a [TargetDefinition],
}

impl<'a> TargetCompiler<'a> {
    pub fn new(toolchain: &'a Toolchain, targets: &'a [TargetDefinition]) -> Self {
        TargetCompiler { toolchain, targets }
    }

    /// Build `package` for every target into `out_dir/<artifact name>`.
    ///
    /// Stops at the first failing target. Returns the binaries written, in
    /// target order.
    pub fn compile(
        &self,
        package: &str,
        work_dir: Option<&Path>,
        out_dir: &Path,
        artifact_base: &str,
        prefix: &str,
    ) -> Result<Vec<PathBuf>, BuildError> {
        fs::create_dir_all(out_dir).map_err(|source| BuildError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut artifacts = Vec::with_capacity(self.targets.len());
        for target in self.targets {
            let invocation = target.invocation(artifact_base, out_dir);
            tracing::debug!("{}compiling {} for {}", prefix, artifact_base, target);
            self.toolchain
                .build(package, work_dir, &invocation, prefix)?;
            artifacts.push(invocation.output);
        }
        Ok(artifacts)
    }
}
