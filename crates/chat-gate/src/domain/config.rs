//! Gate configuration with validation.

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// Main gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Time-of-day access band
    pub access_window: AccessWindowConfig,
    /// Write-rate limiting
    pub rate_limit: RateLimitConfig,
    /// Route-scoped role check
    pub roles: RoleConfig,
    /// Client address resolution
    pub security: SecurityConfig,
}

impl GateConfig {
    /// Load from a JSON file. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: GateConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = &self.access_window;
        if window.open_hour > 23 || window.close_hour > 23 {
            return Err(ConfigError::InvalidAccessWindow(format!(
                "hours must be within 0..=23 (open={}, close={})",
                window.open_hour, window.close_hour
            )));
        }
        if window.open_hour == window.close_hour {
            return Err(ConfigError::InvalidAccessWindow(
                "open_hour and close_hour cannot be equal".into(),
            ));
        }

        let limit = &self.rate_limit;
        if limit.max_requests == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_requests cannot be 0".into(),
            ));
        }
        if limit.window.is_zero() {
            return Err(ConfigError::InvalidRateLimit("window cannot be 0".into()));
        }
        if limit.idle_ttl < limit.window {
            return Err(ConfigError::InvalidRateLimit(
                "idle_ttl must be at least as long as window".into(),
            ));
        }
        if limit.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidRateLimit(
                "sweep_interval cannot be 0".into(),
            ));
        }
        if limit.max_tracked_addresses == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_tracked_addresses cannot be 0".into(),
            ));
        }

        if self.roles.privileged.is_empty() {
            return Err(ConfigError::InvalidRoles(
                "privileged role set cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

/// Access window configuration.
///
/// The band wraps midnight when `open_hour > close_hour`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessWindowConfig {
    pub enabled: bool,
    /// First allowed hour (inclusive)
    pub open_hour: u8,
    /// First denied hour after the band (exclusive end)
    pub close_hour: u8,
}

impl Default for AccessWindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_hour: 21,
            close_hour: 6,
        }
    }
}

/// Sliding-window rate limiting for write requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Write requests allowed per window per address
    pub max_requests: usize,
    /// Trailing window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Addresses exempt from rate limiting
    pub whitelist: Vec<IpAddr>,
    /// Entries idle longer than this are swept
    #[serde(with = "humantime_serde")]
    pub idle_ttl: Duration,
    /// How often the sweep runs
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Upper bound on tracked addresses
    pub max_tracked_addresses: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window: Duration::from_secs(60),
            whitelist: Vec::new(),
            idle_ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
            max_tracked_addresses: 100_000,
        }
    }
}

/// Role check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Roles admitted on privileged routes
    pub privileged: Vec<Role>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            privileged: vec![Role::Admin, Role::Moderator],
        }
    }
}

/// Client address resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Use the first `X-Forwarded-For` entry when present
    pub trust_forwarded_for: bool,
    /// When non-empty, only these peers may set `X-Forwarded-For`
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_for: true,
            trusted_proxies: Vec::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid access window: {0}")]
    InvalidAccessWindow(String),
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    #[error("invalid roles: {0}")]
    InvalidRoles(String),
    #[error("cannot read configuration: {0}")]
    Io(String),
    #[error("cannot parse configuration: {0}")]
    Parse(String),
}

/// Duration (de)serialization as `"60s"`, `"500ms"`, `"10m"` or plain seconds
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be tried before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
