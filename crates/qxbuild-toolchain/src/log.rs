//! Quiet-mode aware logging. When QXBUILD_QUIET=1, suppress [INFO] chatter
//! such as download progress. Uses `tracing::info!` so output is captured by
//! the tracing subscriber.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    qxbuild_core::observability::is_quiet()
}
