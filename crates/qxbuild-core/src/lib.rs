pub mod config;
pub mod error;
pub mod generation;
pub mod observability;
pub mod relpath;

pub use error::{BuildError, BuildResult};
