//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "prometheus_throttle=info";

/// Install a default fmt subscriber unless the host already set one.
///
/// `RUST_LOG` wins when present; otherwise [`DEFAULT_FILTER`] is used.
/// Scheduler diagnostics are emitted at `debug`, so enable them with
/// `RUST_LOG=prometheus_throttle=debug`.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Same as [`init_tracing`] with a caller-chosen fallback filter.
pub fn init_tracing_with(fallback: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
