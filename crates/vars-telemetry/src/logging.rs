//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` fmt subscriber filtered by the
//! configured directive, emitting plain text or JSON lines.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::EnvFilter;

/// Structured logger handle
#[derive(Debug)]
pub struct StructuredLogger {
    installed: bool,
}

impl StructuredLogger {
    /// Whether a global subscriber was installed by this handle.
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

/// Build the filter for a configuration.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level '{}': {e}", config.log_level)))
}

/// Install the global subscriber.
///
/// Fails with `LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    if !config.console_output {
        return Ok(StructuredLogger { installed: false });
    }

    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );

    Ok(StructuredLogger { installed: true })
}
