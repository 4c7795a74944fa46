//! Plugforge plugin compilation
//!
//! Discovers plugin directories, asks each plugin to describe itself,
//! checks it is distributable, and cross-compiles it and its test harness
//! for the target matrix on a bounded worker pool.

pub mod compiler;
pub mod descriptor;
pub mod errors;
pub mod plugin;
pub mod pool;
pub mod scanner;
pub mod target;
pub mod toolchain;
pub mod validator;
pub mod worker_id;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use errors::{BuildError, PoolError, WorkerFailure};
pub use plugin::{BuildContext, BuildSummary};
pub use pool::{host_parallelism, PoolConfig, WorkerPool};
pub use scanner::{scan_plugin_dirs, MatchPattern, PluginSourceUnit};
pub use target::{parse_selectors, resolve_targets, TargetDefinition, TargetSelector};
pub use toolchain::Toolchain;
