//! Node configuration: defaults, then an optional JSON file, then
//! environment overrides.

use anyhow::{Context, Result};
use chat_gate::GateConfig;
use std::net::SocketAddr;
use tracing::{info, warn};

/// Path of the JSON gate configuration file
pub const CONFIG_PATH_VAR: &str = "CHAT_GATE_CONFIG";
/// Listen address override
pub const ADDR_VAR: &str = "CHAT_GATE_ADDR";
/// Write requests per window override
pub const RATE_LIMIT_VAR: &str = "CHAT_RATE_LIMIT";
/// Access window on/off override
pub const ACCESS_WINDOW_VAR: &str = "CHAT_ACCESS_WINDOW_ENABLED";

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen_addr: SocketAddr,
    pub gate: GateConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            gate: GateConfig::default(),
        }
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig> {
    load_config_with(|key| std::env::var(key).ok())
}

/// Load configuration reading variables through `lookup`.
pub fn load_config_with(lookup: impl Fn(&str) -> Option<String>) -> Result<NodeConfig> {
    let mut config = NodeConfig::default();

    if let Some(path) = lookup(CONFIG_PATH_VAR) {
        config.gate = GateConfig::from_file(&path)
            .with_context(|| format!("Failed to load gate configuration from {}", path))?;
        info!(path = %path, "Loaded gate configuration file");
    }

    if let Some(addr) = lookup(ADDR_VAR) {
        config.listen_addr = addr
            .parse()
            .with_context(|| format!("{} is not a socket address: {}", ADDR_VAR, addr))?;
    }

    if let Some(limit) = lookup(RATE_LIMIT_VAR) {
        match limit.parse() {
            Ok(limit) => config.gate.rate_limit.max_requests = limit,
            Err(_) => warn!(value = %limit, "{} must be a positive integer, ignoring", RATE_LIMIT_VAR),
        }
    }

    if let Some(flag) = lookup(ACCESS_WINDOW_VAR) {
        config.gate.access_window.enabled = parse_flag(&flag);
    }

    config
        .gate
        .validate()
        .context("Invalid gate configuration")?;

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
