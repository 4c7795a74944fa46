//! plugforge library - command handlers and shared CLI types

pub mod commands;
pub mod common;
pub mod errors;

pub use common::GlobalOpts;
