//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a formatting subscriber filtered by `filter`.
///
/// An unparsable directive falls back to [`DEFAULT_LOG_FILTER`]. Returns
/// `false` when a global subscriber was already installed, in which case the
/// existing one stays in place.
pub fn init_logging(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
