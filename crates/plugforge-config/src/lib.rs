//! Configuration for the plugforge CLI
//!
//! This crate provides:
//! - the optional `plugforge.toml` settings file
//! - toolchain program resolution
//! - host platform naming in the toolchain's OS/arch vocabulary

pub mod host;
pub mod settings;

pub use host::HostPlatform;
pub use settings::{Config, ConfigError};
