//! Host platform naming
//!
//! Cross-compilation targets are named with the toolchain's vocabulary
//! (`darwin`, `amd64`, ...) rather than Rust's (`macos`, `x86_64`, ...).
//! This module translates the running host into that vocabulary so the
//! "local" target can be resolved without a lookup table.

use std::fmt;

const WINDOWS_EXE_SUFFIX: &str = ".exe";

/// Executable suffix for binaries targeting `os` (toolchain name)
pub fn exe_suffix(os: &str) -> &'static str {
    if os == "windows" {
        WINDOWS_EXE_SUFFIX
    } else {
        ""
    }
}

/// An OS/architecture pair expressed in toolchain terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    /// The platform this process is running on
    pub fn current() -> Self {
        HostPlatform {
            os: toolchain_os(std::env::consts::OS).to_string(),
            arch: toolchain_arch(std::env::consts::ARCH).to_string(),
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// Translate a Rust `std::env::consts::OS` value to the toolchain name
pub fn toolchain_os(rust_os: &str) -> &str {
    match rust_os {
        "macos" => "darwin",
        other => other,
    }
}

/// Translate a Rust `std::env::consts::ARCH` value to the toolchain name
pub fn toolchain_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
}
