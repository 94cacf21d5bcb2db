pub mod entities;

// Re-export tracing for use in this crate
pub use tracing;

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `default_filter`.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
