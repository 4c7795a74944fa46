//! Run manifest assembly
//!
//! Entries arrive in completion order from the worker pool. The assembler
//! keeps them in arrival order, except the core entry, which is always
//! listed first.

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::ManifestError;
use crate::types::{BuildManifest, ManifestEntry, CORE_NAME};

pub struct ManifestAssembler {
    manifest: BuildManifest,
    seen: AHashSet<String>,
}

impl ManifestAssembler {
    pub fn new(core_version: &str, created_time: DateTime<Utc>) -> Self {
        ManifestAssembler {
            manifest: BuildManifest::new(core_version, created_time),
            seen: AHashSet::new(),
        }
    }

    /// Place the core entry at the head of the plugin list
    pub fn set_core(&mut self, entry: ManifestEntry) -> Result<(), ManifestError> {
        self.claim(&entry.name)?;
        self.manifest.plugins.insert(0, entry);
        Ok(())
    }

    /// Append a finished plugin; a name may appear only once per run
    pub fn push(&mut self, entry: ManifestEntry) -> Result<(), ManifestError> {
        self.claim(&entry.name)?;
        debug!("Adding {} to manifest", entry.name);
        self.manifest.plugins.push(entry);
        Ok(())
    }

    fn claim(&mut self, name: &str) -> Result<(), ManifestError> {
        if !self.seen.insert(name.to_string()) {
            return Err(ManifestError::DuplicateEntry(name.to_string()));
        }
        Ok(())
    }

    pub fn has_core(&self) -> bool {
        self.seen.contains(CORE_NAME)
    }

    pub fn len(&self) -> usize {
        self.manifest.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.plugins.is_empty()
    }

    pub fn finish(self) -> BuildManifest {
        self.manifest
    }
}
