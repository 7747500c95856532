use tracing_subscriber::EnvFilter;

/// Routes `weave` events to the test output. Set `RUST_LOG=weave=debug` to
/// see them.
pub fn setup_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weave=warn")),
        )
        .with_test_writer()
        .try_init();
}
