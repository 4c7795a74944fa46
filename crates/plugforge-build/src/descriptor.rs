//! Descriptor extraction
//!
//! A plugin describes itself: the extractor builds and runs it with the
//! reserved `info` argument and decodes the single JSON document it prints.

use plugforge_manifest::PluginDescriptor;
use std::path::Path;

use crate::errors::BuildError;
use crate::toolchain::Toolchain;

/// Argument a plugin answers with its descriptor
pub const INFO_ARG: &str = "info";

/// Run `package` with `info` and decode its standard output.
///
/// `source_dir` is only used to label errors.
pub fn extract_descriptor(
    toolchain: &Toolchain,
    package: &str,
    work_dir: Option<&Path>,
    source_dir: &Path,
    prefix: &str,
) -> Result<PluginDescriptor, BuildError> {
    let output = toolchain.run_info(package, work_dir, prefix)?;

    let descriptor =
        PluginDescriptor::from_info_output(&output.stdout).map_err(|source| {
            BuildError::Descriptor {
                path: source_dir.to_path_buf(),
                output: output.combined(),
                source,
            }
        })?;

    tracing::debug!("{}read descriptor {}", prefix, descriptor);
    Ok(descriptor)
}
