//! # Vars Telemetry
//!
//! Logging setup for event variables.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vars_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EV_SERVICE_NAME` | `event-vars` | Service name in the startup log |
//! | `EV_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `EV_CONSOLE_OUTPUT` | `true` | Install a console subscriber |
//! | `EV_JSON_LOGS` | `false` | JSON formatted logs |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, StructuredLogger};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let logger = init_logging(&config)?;
    if logger.is_installed() {
        tracing::info!(service = %config.service_name, "Telemetry initialized");
    }
    Ok(TelemetryGuard {
        service_name: config.service_name,
        _logger: logger,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _logger: StructuredLogger,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
