//! # Gate Node
//!
//! Messaging node serving conversations and messages behind the chat gate.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`chat-telemetry`)
//! 2. Load configuration (defaults, `CHAT_GATE_CONFIG` file, env overrides)
//! 3. Build the authorization pipeline
//! 4. Spawn the rate limiter sweep task
//! 5. Serve the router until Ctrl+C
//!
//! ## Modules
//!
//! - `config` - node configuration loading
//! - `identity` - identity headers from the upstream authenticator
//! - `store` - in-memory conversations and messages
//! - `handlers` - route handlers with object-level checks
//! - `router` - route groups and their guards

pub mod config;
pub mod handlers;
pub mod identity;
pub mod router;
pub mod store;

pub use config::{load_config, load_config_with, NodeConfig};
pub use handlers::AppState;
pub use router::build_router;
