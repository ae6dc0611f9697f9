//! Diagnostic tracing for gitlock.
//!
//! - **Tracing (this module)**: developer diagnostics via `RUST_LOG`, written
//!   to stderr. Not persisted.
//! - **Audit log (`events`)**: lock actions recorded per clone, always
//!   written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn`. `RUST_LOG=gitlock=debug` shows
/// every backend invocation and its exit code.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // try_init: a second call (e.g. from tests) is a no-op rather than a panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
