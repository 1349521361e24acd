//! Development-time tracing for the check-in tools.
//!
//! Diagnostics only: state names, session ids and counts. Whatever the child
//! types never goes through tracing; it lives only in the record log.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=checkin=debug checkin chat
/// ```
pub fn init() {
    init_with_default("warn");
}

/// Like [`init`], with a caller-chosen filter when `RUST_LOG` is unset.
pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
