//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level so a single run
//! can be made more verbose without touching the config file.

use banklink_domain::{BankLinkError, LogFormat, LoggingConfig, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// # Errors
/// Returns `Config` if the level directive is invalid or a subscriber was
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_current_span(true))
            .try_init(),
    };

    result.map_err(|e| BankLinkError::Config(format!("Failed to initialize logging: {e}")))?;

    tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| BankLinkError::Config(format!("Invalid log level '{}': {e}", config.level))),
    }
}
