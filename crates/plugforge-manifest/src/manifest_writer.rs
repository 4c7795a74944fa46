//! YAML persistence for manifests and plugin descriptors
//!
//! Layout under the artifacts root:
//! - `<root>/manifest.yaml`
//! - `<root>/<plugin name>/plugin.yaml`

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::ManifestError;
use crate::types::{BuildManifest, PluginDescriptor, MANIFEST_FILE_NAME, PLUGIN_FILE_NAME};

pub fn manifest_path(artifacts_root: &Path) -> PathBuf {
    artifacts_root.join(MANIFEST_FILE_NAME)
}

pub fn descriptor_path(artifacts_root: &Path, plugin_name: &str) -> PathBuf {
    artifacts_root.join(plugin_name).join(PLUGIN_FILE_NAME)
}

/// Write the run manifest, returning the path written
pub fn write_manifest(
    manifest: &BuildManifest,
    artifacts_root: &Path,
) -> Result<PathBuf, ManifestError> {
    let path = manifest_path(artifacts_root);
    write_yaml(manifest, &path, "manifest")?;

    info!("Manifest written successfully to: {:?}", path);
    info!("Total plugins: {}", manifest.plugins.len());

    Ok(path)
}

/// Write a plugin's descriptor next to its versioned artifacts
pub fn write_descriptor(
    descriptor: &PluginDescriptor,
    artifacts_root: &Path,
) -> Result<PathBuf, ManifestError> {
    let path = descriptor_path(artifacts_root, &descriptor.name);
    write_yaml(descriptor, &path, &format!("descriptor for {}", descriptor.name))?;
    Ok(path)
}

#[cfg(test)]
fn read_manifest(path: &Path) -> Result<BuildManifest, ManifestError> {
    read_yaml(path)
}

pub fn read_descriptor(path: &Path) -> Result<PluginDescriptor, ManifestError> {
    read_yaml(path)
}

fn write_yaml<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<(), ManifestError> {
    debug!("Writing {} to {:?}", what, path);

    let yaml = serde_yaml::to_string(value).map_err(|source| ManifestError::Serialize {
        what: what.to_string(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ManifestError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, yaml).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
