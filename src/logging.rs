//! Logging configuration for billing-digest.
//!
//! Logs go to stderr, where the invoking platform collects them.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_FILTER: &str = "info";

/// Initializes stderr logging.
///
/// `RUST_LOG` takes precedence over `level`, which takes precedence over the default.
pub fn init_logging(level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(resolve_filter(std::env::var("RUST_LOG").ok(), level))
        .with_writer(std::io::stderr)
        .init();
}

/// Picks the filter directive from the environment value and the command line.
pub fn resolve_filter(env: Option<String>, level: Option<&str>) -> EnvFilter {
    env.and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| level.and_then(|l| EnvFilter::try_new(l).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
