//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for QXBUILD_QUIET, QXBUILD_LOG_LEVEL, QXBUILD_LOG_JSON.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call at process startup.
/// When QXBUILD_QUIET=1, only WARN and above are logged. RUST_LOG wins when set.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level: String = if cfg.quiet {
        "qxbuild=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

/// Whether `[INFO]` chatter (download progress etc.) should be suppressed.
pub fn is_quiet() -> bool {
    crate::config::ObservabilityConfig::from_env().quiet
}
