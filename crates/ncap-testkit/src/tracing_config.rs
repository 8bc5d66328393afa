//! Tracing output for test runs.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a test binary.
///
/// Respects `RUST_LOG`; defaults to `debug` for the ncap crates. Safe to
/// call from every test — later calls are no-ops.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ncap_core=debug,ncap_node=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init();
}
