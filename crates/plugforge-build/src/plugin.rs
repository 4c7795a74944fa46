//! Per-plugin build sequence
//!
//! One worker takes one plugin directory through extraction, validation,
//! compilation of the plugin and its test harness, and finally writes the
//! plugin's descriptor. Steps run strictly in that order; nothing is written
//! under the artifacts root until validation has passed.

use ahash::AHashMap;
use parking_lot::Mutex;
use plugforge_logger as logger;
use plugforge_manifest::{write_descriptor, PluginDescriptor, CORE_NAME, VERSION_LATEST};
use std::path::{Path, PathBuf};

use crate::compiler::TargetCompiler;
use crate::descriptor::extract_descriptor;
use crate::errors::BuildError;
use crate::scanner::PluginSourceUnit;
use crate::target::TargetDefinition;
use crate::toolchain::{package_arg, Toolchain};
use crate::validator::{validate, TEST_DIR_NAME};

/// Marker file of a plugin that is its own module
pub const MODULE_FILE_NAME: &str = "go.mod";

/// How a plugin directory is handed to the toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLayout {
    /// Built from the current directory as `./<path>`
    Package,
    /// Has its own module file; built from inside its directory
    Module,
}

/// Package arguments and working directory for one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSources {
    pub layout: SourceLayout,
    pub work_dir: Option<PathBuf>,
    pub plugin_package: String,
    pub test_package: String,
}

impl PluginSources {
    pub fn detect(source_dir: &Path) -> Self {
        if source_dir.join(MODULE_FILE_NAME).is_file() {
            PluginSources {
                layout: SourceLayout::Module,
                work_dir: Some(source_dir.to_path_buf()),
                plugin_package: package_arg(Path::new(".")),
                test_package: package_arg(Path::new(TEST_DIR_NAME)),
            }
        } else {
            PluginSources {
                layout: SourceLayout::Package,
                work_dir: None,
                plugin_package: package_arg(source_dir),
                test_package: package_arg(&source_dir.join(TEST_DIR_NAME)),
            }
        }
    }

    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }
}

// =============================================================================
// NAME REGISTRY
// =============================================================================

/// Plugin names claimed so far in this run, shared by every worker
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: Mutex<AHashMap<String, PathBuf>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `source_dir`; a name can only be claimed once.
    pub fn claim(&self, name: &str, source_dir: &Path) -> Result<(), BuildError> {
        let mut claimed = self.claimed.lock();
        if let Some(existing) = claimed.get(name) {
            return Err(BuildError::DuplicatePlugin {
                name: name.to_string(),
                path: source_dir.to_path_buf(),
                existing: existing.clone(),
            });
        }
        claimed.insert(name.to_string(), source_dir.to_path_buf());
        Ok(())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// BUILD
// =============================================================================

/// What a worker hands to the collector for a finished plugin
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub descriptor: PluginDescriptor,
    pub worker_id: &'static str,
    pub source_dir: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

/// Everything a worker needs, fixed for the whole run
#[derive(Debug)]
pub struct BuildContext {
    pub toolchain: Toolchain,
    pub targets: Vec<TargetDefinition>,
    pub artifacts_root: PathBuf,
    pub version: String,
    pub names: NameRegistry,
}

impl BuildContext {
    pub fn new(
        toolchain: Toolchain,
        targets: Vec<TargetDefinition>,
        artifacts_root: PathBuf,
        version: &str,
    ) -> Self {
        BuildContext {
            toolchain,
            targets,
            artifacts_root,
            version: version.to_string(),
            names: NameRegistry::new(),
        }
    }

    fn compiler(&self) -> TargetCompiler<'_> {
        TargetCompiler::new(&self.toolchain, &self.targets)
    }

    fn version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.artifacts_root.join(name).join(version)
    }

    /// Build one discovered plugin end to end
    pub fn build_plugin(
        &self,
        unit: &PluginSourceUnit,
        worker_id: &'static str,
    ) -> Result<BuildSummary, BuildError> {
        let prefix = format!("{} - ", worker_id);
        let sources = PluginSources::detect(&unit.path);
        logger::info(&format!("{}building plugin at path {:?}", prefix, unit.path));

        if sources.layout == SourceLayout::Module {
            self.toolchain.mod_download(&unit.path, &prefix)?;
        }

        let descriptor = extract_descriptor(
            &self.toolchain,
            &sources.plugin_package,
            sources.work_dir(),
            &unit.path,
            &prefix,
        )?;
        let plugin = validate(descriptor, &unit.path, worker_id)?;
        tracing::debug!(
            "{}validated {}: tests in {:?}, docs at {:?}",
            prefix,
            plugin.name(),
            plugin.test_dir,
            plugin.doc_path
        );
        self.names.claim(plugin.name(), &plugin.source_dir)?;

        let name = plugin.name().to_string();
        let out_dir = self.version_dir(&name, &plugin.descriptor.version);
        let compiler = self.compiler();

        let mut artifacts = compiler.compile(
            &sources.plugin_package,
            sources.work_dir(),
            &out_dir,
            &name,
            &prefix,
        )?;
        logger::step(&format!("{}compiled {} for {} target(s)", prefix, name, self.targets.len()));

        artifacts.extend(compiler.compile(
            &sources.test_package,
            sources.work_dir(),
            &out_dir.join(TEST_DIR_NAME),
            &format!("{}-{}", name, TEST_DIR_NAME),
            &prefix,
        )?);

        write_descriptor(&plugin.descriptor, &self.artifacts_root)?;
        logger::info(&format!("{}plugin {} built", prefix, plugin.descriptor));

        Ok(BuildSummary {
            descriptor: plugin.descriptor,
            worker_id: plugin.worker_id,
            source_dir: plugin.source_dir,
            artifacts,
        })
    }

    /// Build the core binary for the run's version and for `latest`.
    ///
    /// The core reports no descriptor of its own and has no test harness.
    pub fn build_core(&self, core_path: &Path) -> Result<BuildSummary, BuildError> {
        self.names.claim(CORE_NAME, core_path)?;

        let sources = PluginSources::detect(core_path);
        if sources.layout == SourceLayout::Module {
            self.toolchain.mod_download(core_path, "")?;
        }

        let compiler = self.compiler();
        let mut artifacts = Vec::new();
        for version in [self.version.as_str(), VERSION_LATEST] {
            artifacts.extend(compiler.compile(
                &sources.plugin_package,
                sources.work_dir(),
                &self.version_dir(CORE_NAME, version),
                CORE_NAME,
                "",
            )?);
        }

        let descriptor = PluginDescriptor::core(&self.version);
        write_descriptor(&descriptor, &self.artifacts_root)?;

        Ok(BuildSummary {
            descriptor,
            worker_id: CORE_NAME,
            source_dir: core_path.to_path_buf(),
            artifacts,
        })
    }
}
