//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log filter directive (e.g. `info`, `event_vars=debug`)
    pub log_level: String,

    /// Whether to install a console subscriber at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "event-vars".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EV_SERVICE_NAME`: Service name (default: event-vars)
    /// - `EV_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `EV_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `EV_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("EV_SERVICE_NAME").unwrap_or_else(|| "event-vars".to_string()),

            log_level: lookup("EV_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            console_output: lookup("EV_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("EV_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Quiet configuration for test suites: warnings only, plain text.
    pub fn for_tests() -> Self {
        Self {
            service_name: "event-vars-tests".to_string(),
            log_level: "warn".to_string(),
            ..Self::default()
        }
    }
}
