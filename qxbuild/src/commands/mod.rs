//! Subcommand handlers. Each returns `anyhow::Result` and adds command-level
//! context on top of the library errors.

pub mod compile;
pub mod generate_config;
pub mod relpath;
pub mod status;
pub mod toolchain;
