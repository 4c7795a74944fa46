//! `plugforge compile`: build a local plugin repository
//!
//! Flow:
//! 1. resolve settings (flags over config file over defaults)
//! 2. scan the plugin root and resolve the target set
//! 3. build the core binary, if requested, before any plugin
//! 4. build every plugin on the worker pool
//! 5. write the manifest once everything succeeded

use chrono::Utc;
use clap::Args;
use plugforge_build::worker_id::{random_offset, WORKER_IDS};
use plugforge_build::{
    host_parallelism, parse_selectors, resolve_targets, scan_plugin_dirs, BuildContext,
    BuildSummary, MatchPattern, PoolConfig, Toolchain, WorkerPool,
};
use plugforge_config::{Config, HostPlatform};
use plugforge_logger as logger;
use plugforge_manifest::{write_manifest, ManifestAssembler, ManifestEntry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::CompileError;

#[derive(Args, Debug, Clone, Default)]
pub struct CompileCommand {
    /// Version of the root CLI (required)
    #[arg(long)]
    pub version: Option<String>,

    /// ldflags to set on build
    #[arg(long, default_value = "")]
    pub ldflags: String,

    /// Match a plugin directory name to build, supports globbing
    #[arg(long = "match", default_value = "*")]
    pub match_pattern: String,

    /// Only compile for specific targets (comma separated or repeated); 'local' compiles for the host
    #[arg(long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Path of the plugins directory [default: ./cmd/cli/plugin]
    #[arg(long)]
    pub path: Option<String>,

    /// Path to output artifacts [default: artifacts]
    #[arg(long)]
    pub artifacts: Option<String>,

    /// Path of the core binary source
    #[arg(long)]
    pub corepath: Option<String>,

    /// Build tags passed to every toolchain invocation
    #[arg(long)]
    pub tags: Option<String>,

    /// GOPRIVATE value for every toolchain invocation
    #[arg(long)]
    pub goprivate: Option<String>,

    /// Compiler toolchain program [default: go]
    #[arg(long)]
    pub toolchain: Option<String>,

    /// Kill any toolchain invocation running longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Outcome of a successful compile run
#[derive(Debug)]
pub struct CompileReport {
    pub manifest_path: PathBuf,
    pub plugins: Vec<BuildSummary>,
    pub core: Option<BuildSummary>,
    pub elapsed: Duration,
}

impl CompileReport {
    /// Binaries written by this run, core included
    pub fn artifact_count(&self) -> usize {
        self.plugins
            .iter()
            .chain(self.core.as_ref())
            .map(|summary| summary.artifacts.len())
            .sum()
    }
}

pub fn handle_compile(cmd: CompileCommand) -> Result<CompileReport, CompileError> {
    let started = Instant::now();

    let version = cmd
        .version
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(CompileError::MissingVersion)?
        .to_string();

    let config = Config::load()?;
    let pattern = MatchPattern::new(&cmd.match_pattern)?;
    let selectors = parse_selectors(&cmd.targets)?;
    let targets = resolve_targets(&selectors, &HostPlatform::current());

    let plugin_root = config.plugin_path(cmd.path.as_deref());
    let artifacts_root = absolute(&config.artifacts_dir(cmd.artifacts.as_deref()))?;

    let toolchain = Toolchain::new(config.resolve_toolchain(cmd.toolchain.as_deref())?)
        .with_ldflags(cmd.ldflags.as_str())
        .with_tags(config.tags(cmd.tags.as_deref()))
        .with_goprivate(config.goprivate(cmd.goprivate.as_deref()))
        .with_timeout(config.command_timeout(cmd.timeout));

    let units = scan_plugin_dirs(&plugin_root, &pattern)?;

    logger::info(&format!(
        "building local repository at {}",
        artifacts_root.display()
    ));
    logger::debug(&format!(
        "{} plugin(s) matched '{}' under {}; targets: {}",
        units.len(),
        pattern.as_str(),
        plugin_root.display(),
        targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let context = Arc::new(BuildContext::new(
        toolchain,
        targets,
        artifacts_root.clone(),
        &version,
    ));
    let mut assembler = ManifestAssembler::new(&version, Utc::now());

    let core = match cmd.corepath.as_deref() {
        Some(core_path) => Some(build_core(&context, Path::new(core_path), &mut assembler)?),
        None => None,
    };

    let pool_config = PoolConfig::new(host_parallelism(), random_offset(WORKER_IDS.len()));
    logger::debug(&format!(
        "Building with up to {} concurrent worker(s)",
        pool_config.concurrency()
    ));
    let pool = WorkerPool::new(&pool_config)?;

    let worker_context = Arc::clone(&context);
    let plugins = pool.run(units, move |unit, id| worker_context.build_plugin(unit, id))?;

    for summary in &plugins {
        assembler.push(ManifestEntry::from(&summary.descriptor))?;
    }
    logger::debug(&format!(
        "manifest lists {} entr(ies){}",
        assembler.len(),
        if assembler.has_core() { ", core first" } else { "" }
    ));

    let manifest = assembler.finish();
    let manifest_path = write_manifest(&manifest, &artifacts_root)?;

    Ok(CompileReport {
        manifest_path,
        plugins,
        core,
        elapsed: started.elapsed(),
    })
}

fn build_core(
    context: &BuildContext,
    core_path: &Path,
    assembler: &mut ManifestAssembler,
) -> Result<BuildSummary, CompileError> {
    logger::spinner_start("building core binary");
    match context.build_core(core_path) {
        Ok(summary) => {
            logger::spinner_success(&format!("built core {}", summary.descriptor.version));
            assembler.set_core(ManifestEntry::from(&summary.descriptor))?;
            Ok(summary)
        }
        Err(err) => {
            logger::spinner_error("core build failed");
            Err(err.into())
        }
    }
}

/// Subprocesses run from plugin directories, so output paths must not be
/// relative to ours.
fn absolute(path: &Path) -> Result<PathBuf, CompileError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })
}
