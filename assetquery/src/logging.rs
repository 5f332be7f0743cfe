//! Logging infrastructure for AssetQuery.
//!
//! Console-only structured logging for the batch CLI:
//! - Configurable via the RUST_LOG environment variable
//! - Defaults to INFO when RUST_LOG is not set

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// Sets up a console subscriber filtered by RUST_LOG (default `info`).
/// Call exactly once, before any pipeline stage runs.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
}
