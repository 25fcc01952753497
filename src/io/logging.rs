//! Tracing subscriber setup for the command-line tool

use crate::io::configuration::{DEFAULT_LOG_FILTER, QUIET_LOG_FILTER};
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set
pub const fn default_filter(quiet: bool) -> &'static str {
    if quiet {
        QUIET_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Install a stderr fmt subscriber honoring `RUST_LOG`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(quiet: bool) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(quiet))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
