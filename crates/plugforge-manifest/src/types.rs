//! Descriptor and manifest types
//!
//! `PluginDescriptor` is what a plugin reports about itself when invoked
//! with `info`; it is decoded from JSON and re-encoded as `plugin.yaml`.
//! `BuildManifest` is the run-level inventory written to `manifest.yaml`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// File name of the run manifest under the artifacts root
pub const MANIFEST_FILE_NAME: &str = "manifest.yaml";
/// File name of each plugin's descriptor under `<artifacts>/<name>/`
pub const PLUGIN_FILE_NAME: &str = "plugin.yaml";
/// Name reserved for the core binary
pub const CORE_NAME: &str = "core";
/// Floating version alias the core binary is also published under
pub const VERSION_LATEST: &str = "latest";

const CORE_DESCRIPTION: &str = "The core CLI";
const CORE_GROUP: &str = "System";

// =============================================================================
// COMPLETION TYPE
// =============================================================================

/// How shell completion for a plugin is produced
///
/// Encoded as an integer on the wire to match what plugins print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CompletionType {
    /// Completion through the command framework's own mechanism
    #[default]
    Native,
    /// Completion from the static `completionArgs` list
    Static,
    /// Completion retrieved at runtime through `completionCmd`
    Dynamic,
}

impl TryFrom<u8> for CompletionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CompletionType::Native),
            1 => Ok(CompletionType::Static),
            2 => Ok(CompletionType::Dynamic),
            other => Err(format!("unknown completion type {}", other)),
        }
    }
}

impl From<CompletionType> for u8 {
    fn from(value: CompletionType) -> Self {
        match value {
            CompletionType::Native => 0,
            CompletionType::Static => 1,
            CompletionType::Dynamic => 2,
        }
    }
}

// =============================================================================
// PLUGIN DESCRIPTOR
// =============================================================================

fn is_false(value: &bool) -> bool {
    !*value
}

/// Self-reported identity of a plugin
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(rename = "buildSHA")]
    pub build_sha: String,
    pub group: String,
    #[serde(rename = "docURL")]
    pub doc_url: String,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
    pub completion_type: CompletionType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completion_args: Vec<String>,
    #[serde(rename = "completionCmd", skip_serializing_if = "String::is_empty")]
    pub completion_command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl PluginDescriptor {
    /// Decode the JSON document a plugin prints for its `info` invocation
    pub fn from_info_output(output: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(output.trim())
    }

    /// Descriptor published for the core binary
    pub fn core(version: &str) -> Self {
        PluginDescriptor {
            name: CORE_NAME.to_string(),
            description: CORE_DESCRIPTION.to_string(),
            version: version.to_string(),
            group: CORE_GROUP.to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

// =============================================================================
// BUILD MANIFEST
// =============================================================================

/// One plugin listed in the run manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub description: String,
}

impl From<&PluginDescriptor> for ManifestEntry {
    fn from(descriptor: &PluginDescriptor) -> Self {
        ManifestEntry {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
        }
    }
}

/// Inventory of everything produced by one compile run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    #[serde(rename = "created")]
    pub created_time: DateTime<Utc>,
    #[serde(rename = "coreVersion")]
    pub core_version: String,
    #[serde(default)]
    pub plugins: Vec<ManifestEntry>,
}

impl BuildManifest {
    pub fn new(core_version: &str, created_time: DateTime<Utc>) -> Self {
        BuildManifest {
            created_time,
            core_version: core_version.to_string(),
            plugins: Vec::new(),
        }
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name.as_str())
    }
}
