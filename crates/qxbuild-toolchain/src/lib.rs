//! Interpreter provisioning for the qooxdoo generator.
//!
//! [`Bootstrapper::resolve`] turns a configured interpreter name into a path
//! or command to invoke. The bundled sentinel triggers a one-time download of
//! a platform-matched PyPy archive into a local cache.

pub mod bootstrap;
pub mod extract;
pub mod fetch;
pub mod log;
pub mod permissions;
pub mod platform;
pub mod progress;
pub mod table;

pub use bootstrap::{is_bundled_sentinel, BootstrapState, Bootstrapper, BUNDLED_SENTINEL, FALLBACK_INTERPRETER};
pub use fetch::{FetchResponse, HttpFetch, UreqFetch};
pub use platform::{Bitness, HostPlatform, Os};
pub use table::{ArchiveKind, ArchiveSpec};
