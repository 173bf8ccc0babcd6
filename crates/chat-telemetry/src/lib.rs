//! # Chat Telemetry
//!
//! Subscriber setup shared by the chat gate binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | | Full filter directive, wins over `CHAT_LOG_LEVEL` |
//! | `CHAT_LOG_LEVEL` | `info` | Log level filter |
//! | `CHAT_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |
//! | `CHAT_SERVICE_NAME` | `chat-gate` | Service name attached to the startup event |
//!
//! The request audit trail is emitted on the `request_audit` target, so it can
//! be routed on its own with e.g. `RUST_LOG=info,request_audit=info`.

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize logging. Hold the returned guard for the life of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
