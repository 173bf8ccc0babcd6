//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,

    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Include source file and line in events
    pub with_source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "chat-gate".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CHAT_SERVICE_NAME`: Service name (default: chat-gate)
    /// - `RUST_LOG` or `CHAT_LOG_LEVEL`: Log filter (default: info)
    /// - `CHAT_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CHAT_SERVICE_NAME")
                .unwrap_or_else(|_| "chat-gate".to_string()),

            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("CHAT_LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CHAT_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            with_source_location: is_container,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn json(mut self, json_logs: bool) -> Self {
        self.json_logs = json_logs;
        self
    }
}

/// `true`/`1`/`yes`/`on`, case-insensitive.
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
