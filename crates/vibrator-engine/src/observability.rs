//! Structured logging setup.

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. Returns `Ok(false)`
/// when a global subscriber was already installed, so repeated calls are
/// harmless.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("Invalid log filter: {}", config.filter))?,
    };

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(config.with_thread_names)
        .with_ansi(config.ansi);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            info!(filter = %config.filter, "Structured logging initialized");
            Ok(true)
        }
        Err(e) => {
            debug!("Logging already initialized: {e}");
            Ok(false)
        }
    }
}
