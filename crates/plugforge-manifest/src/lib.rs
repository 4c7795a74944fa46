//! Plugforge manifest management
//!
//! This crate holds the types a compile run produces and persists:
//! - `PluginDescriptor`, the self-reported identity of a plugin
//! - `BuildManifest`, the run inventory written to `manifest.yaml`
//! - `ManifestAssembler`, which collects entries as workers finish
//!
//! Both files are stored as YAML under the artifacts root.

pub mod assembler;
pub mod errors;
pub mod manifest_writer;
pub mod types;

pub use assembler::ManifestAssembler;
pub use errors::ManifestError;
pub use manifest_writer::{
    descriptor_path, manifest_path, read_descriptor, write_descriptor, write_manifest,
};
pub use types::{
    BuildManifest, CompletionType, ManifestEntry, PluginDescriptor, CORE_NAME, MANIFEST_FILE_NAME,
    PLUGIN_FILE_NAME, VERSION_LATEST,
};
