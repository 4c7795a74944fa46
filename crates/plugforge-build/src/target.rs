//! Cross-compilation target matrix
//!
//! The table below is the closed set of distributable targets. Each entry
//! maps `(plugin name, output dir)` to a toolchain invocation without any
//! I/O, so adding a platform means adding a row here and nothing else.

use plugforge_config::host::exe_suffix;
use plugforge_config::HostPlatform;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::BuildError;

/// Selector meaning every entry of the target table
pub const ALL_TARGETS: &str = "all";
/// Selector meaning the host's own platform
pub const LOCAL_TARGET: &str = "local";

/// One OS/architecture pair and how to build for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDefinition {
    pub os: Cow<'static, str>,
    pub arch: Cow<'static, str>,
    /// Extra environment applied on top of the inherited one
    pub env: &'static [(&'static str, &'static str)],
}

const NO_CGO: &[(&str, &str)] = &[("CGO_ENABLED", "0")];

const fn target(
    os: &'static str,
    arch: &'static str,
    env: &'static [(&'static str, &'static str)],
) -> TargetDefinition {
    TargetDefinition {
        os: Cow::Borrowed(os),
        arch: Cow::Borrowed(arch),
        env,
    }
}

/// Every distributable target
pub static TARGET_TABLE: [TargetDefinition; 5] = [
    target("linux", "386", NO_CGO),
    target("linux", "amd64", NO_CGO),
    target("darwin", "amd64", &[]),
    target("windows", "386", &[]),
    target("windows", "amd64", &[]),
];

/// Environment and arguments for one toolchain build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInvocation {
    pub env: SmallVec<[(String, String); 3]>,
    pub args: Vec<String>,
    pub output: PathBuf,
}

impl TargetDefinition {
    /// Target id, e.g. `linux_amd64`
    pub fn id(&self) -> String {
        format!("{}_{}", self.os, self.arch)
    }

    /// `<name>-<os>_<arch>`, plus `.exe` for Windows targets
    pub fn artifact_name(&self, name: &str) -> String {
        format!("{}-{}{}", name, self.id(), exe_suffix(&self.os))
    }

    pub fn invocation(&self, name: &str, out_dir: &Path) -> CompileInvocation {
        let output = out_dir.join(self.artifact_name(name));

        let mut env: SmallVec<[(String, String); 3]> = self
            .env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        env.push(("GOARCH".to_string(), self.arch.to_string()));
        env.push(("GOOS".to_string(), self.os.to_string()));

        CompileInvocation {
            env,
            args: vec!["-o".to_string(), output.to_string_lossy().to_string()],
            output,
        }
    }

    /// The host platform as a target.
    ///
    /// Uses the table row when the host is one of the distributable
    /// targets; otherwise builds a row from the host's names.
    pub fn host(host: &HostPlatform) -> Self {
        if let Some(known) = TARGET_TABLE
            .iter()
            .find(|t| t.os == host.os && t.arch == host.arch)
        {
            return known.clone();
        }
        TargetDefinition {
            os: Cow::Owned(host.os.clone()),
            arch: Cow::Owned(host.arch.clone()),
            env: if host.os == "linux" { NO_CGO } else { &[] },
        }
    }
}

impl fmt::Display for TargetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// A `--target` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    All,
    Local,
    Named(&'static TargetDefinition),
}

impl FromStr for TargetSelector {
    type Err = BuildError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        match value {
            ALL_TARGETS => Ok(TargetSelector::All),
            LOCAL_TARGET => Ok(TargetSelector::Local),
            id => TARGET_TABLE
                .iter()
                .find(|t| t.id() == id)
                .map(TargetSelector::Named)
                .ok_or_else(|| BuildError::UnsupportedTarget(id.to_string())),
        }
    }
}

/// Parse `--target` values; each value may hold a comma separated list
pub fn parse_selectors<S: AsRef<str>>(values: &[S]) -> Result<Vec<TargetSelector>, BuildError> {
    values
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .filter(|value| !value.trim().is_empty())
        .map(TargetSelector::from_str)
        .collect()
}

/// Expand selectors into the ordered, de-duplicated set of targets.
/// No selectors means every target.
pub fn resolve_targets(selectors: &[TargetSelector], host: &HostPlatform) -> Vec<TargetDefinition> {
    if selectors.is_empty() || selectors.contains(&TargetSelector::All) {
        return TARGET_TABLE.to_vec();
    }

    let mut resolved: Vec<TargetDefinition> = Vec::new();
    for selector in selectors {
        let candidate = match selector {
            TargetSelector::Local => TargetDefinition::host(host),
            TargetSelector::Named(target) => (*target).clone(),
            TargetSelector::All => continue,
        };
        if !resolved.iter().any(|t| t.id() == candidate.id()) {
            resolved.push(candidate);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_amd64_host() -> HostPlatform {
        HostPlatform {
            os: "linux".to_string(),
            arch: "amd64".to_string(),
        }
    }

    #[test]
    fn test_table_ids() {
        let ids: Vec<String> = TARGET_TABLE.iter().map(TargetDefinition::id).collect();
        assert_eq!(
            ids,
            vec![
                "linux_386",
                "linux_amd64",
                "darwin_amd64",
                "windows_386",
                "windows_amd64"
            ]
        );
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(
            TARGET_TABLE[1].artifact_name("cluster"),
            "cluster-linux_amd64"
        );
        assert_eq!(
            TARGET_TABLE[4].artifact_name("cluster-test"),
            "cluster-test-windows_amd64.exe"
        );
    }

    #[test]
    fn test_invocation_for_linux_disables_cgo() {
        let inv = TARGET_TABLE[0].invocation("login", Path::new("/out/login/v1.0.0"));
        assert_eq!(
            inv.output,
            PathBuf::from("/out/login/v1.0.0/login-linux_386")
        );
        assert_eq!(inv.args[0], "-o");
        assert!(inv
            .env
            .contains(&("CGO_ENABLED".to_string(), "0".to_string())));
        assert!(inv.env.contains(&("GOOS".to_string(), "linux".to_string())));
        assert!(inv.env.contains(&("GOARCH".to_string(), "386".to_string())));
    }

    #[test]
    fn test_invocation_for_darwin_keeps_cgo() {
        let inv = TARGET_TABLE[2].invocation("login", Path::new("out"));
        assert!(!inv.env.iter().any(|(k, _)| k == "CGO_ENABLED"));
        assert!(inv.env.contains(&("GOOS".to_string(), "darwin".to_string())));
    }

    #[test]
    fn test_all_expands_to_full_table() {
        let targets = resolve_targets(&[TargetSelector::All], &linux_amd64_host());
        assert_eq!(targets.len(), 5);
        assert_eq!(resolve_targets(&[], &linux_amd64_host()).len(), 5);
    }

    #[test]
    fn test_local_resolves_to_host_once() {
        let host = linux_amd64_host();
        let targets = resolve_targets(
            &[TargetSelector::Local, TargetSelector::Named(&TARGET_TABLE[1])],
            &host,
        );
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id(), "linux_amd64");
    }

    #[test]
    fn test_local_outside_table() {
        let host = HostPlatform {
            os: "darwin".to_string(),
            arch: "arm64".to_string(),
        };
        let targets = resolve_targets(&[TargetSelector::Local], &host);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].artifact_name("core"), "core-darwin_arm64");
    }

    #[test]
    fn test_parse_selectors() {
        let parsed = parse_selectors(&["linux_amd64,windows_386", "local"]);
        assert!(parsed.is_ok_and(|s| s
            == vec![
                TargetSelector::Named(&TARGET_TABLE[1]),
                TargetSelector::Named(&TARGET_TABLE[3]),
                TargetSelector::Local
            ]));

        let unknown = parse_selectors(&["plan9_386"]);
        assert!(matches!(unknown, Err(BuildError::UnsupportedTarget(id)) if id == "plan9_386"));
    }
}
