//! Tracing subscriber setup.
//!
//! Call [`init`] once at process startup. Filtering follows `RUST_LOG`
//! (default `info`); repeated calls are harmless no-ops.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber with env-filter semantics.
pub fn init() {
    init_with_default_filter("info");
}

/// Install the global subscriber with an explicit fallback filter used when
/// `RUST_LOG` is unset.
pub fn init_with_default_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
