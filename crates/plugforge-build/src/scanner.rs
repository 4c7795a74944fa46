//! Plugin directory discovery
//!
//! A plugin root holds one directory per plugin. Only immediate
//! subdirectories are considered, filtered by a shell-style glob on the
//! directory name (`*`, `?`, `[abc]`, `[!abc]`, `{a,b}`).

use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::BuildError;

/// A directory believed to hold one plugin's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSourceUnit {
    /// Position in scan order, used to pick the worker id
    pub index: usize,
    pub path: PathBuf,
}

impl PluginSourceUnit {
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Compiled glob matched against whole directory names
#[derive(Debug, Clone)]
pub struct MatchPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl MatchPattern {
    pub fn new(glob: &str) -> Result<Self, BuildError> {
        let matcher = Glob::new(glob)
            .map_err(|e| BuildError::Pattern {
                pattern: glob.to_string(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();
        Ok(MatchPattern {
            raw: glob.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Immediate subdirectories of `root` whose name matches `pattern`,
/// ordered by name.
pub fn scan_plugin_dirs(
    root: &Path,
    pattern: &MatchPattern,
) -> Result<Vec<PluginSourceUnit>, BuildError> {
    if !root.is_dir() {
        return Err(BuildError::Scan {
            path: root.to_path_buf(),
            reason: "not a readable directory".to_string(),
        });
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BuildError::Scan {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        if pattern.matches(&entry.file_name().to_string_lossy()) {
            units.push(PluginSourceUnit {
                index: units.len(),
                path: entry.into_path(),
            });
        }
    }

    tracing::debug!(
        "Matched {} plugin director(ies) under {:?} with '{}'",
        units.len(),
        root,
        pattern.as_str()
    );
    Ok(units)
}
