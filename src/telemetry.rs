//! Logging setup for hosts embedding the console core.

use crate::error::{ConsoleError, Result};
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber
///
/// Returns `Ok(false)` if a subscriber was already installed, so calling this
/// from several entry points is harmless.
pub fn init(fallback_filter: &str) -> Result<bool> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .map_err(|e| ConsoleError::ConfigError(format!("invalid log filter: {}", e)))?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    Ok(installed)
}
