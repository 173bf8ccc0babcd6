// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Chat Gate - request authorization for conversation-based messaging.
//!
//! Every inbound operation passes an ordered list of guards before it reaches
//! a business handler, and handlers run an object-level check once the target
//! conversation or message is loaded.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              CHAT GATE                               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  HTTP request                                                        │
//! │      │                                                               │
//! │  ┌───┴──────────────────────────┐                                    │
//! │  │  TracingLayer → GateLayer    │  client address, identity, target  │
//! │  └───┬──────────────────────────┘                                    │
//! │      │ RequestContext                                                │
//! │  ┌───┴──────────────────────────────────────────────────────────┐    │
//! │  │                  AuthorizationPipeline                       │    │
//! │  │  Audit → AccessWindow → RateLimit → Authentication → Role    │    │
//! │  └───┬──────────────────────────────┬───────────────────────────┘    │
//! │      │ allow                        │ deny → 401 / 403 / 429 / 503   │
//! │  ┌───┴──────────────┐               │                                │
//! │  │  Handler          │──► ParticipantAuthorizer (participant, owner) │
//! │  └──────────────────┘                                                │
//! └──────────────────────────────────────────────────────────────────────┘
//!           │                        │                      │
//!       AuditSink                RateLimitStore           Clock
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use chat_gate::{AuthorizationPipeline, GateConfig, GateLayer, RouteSpec};
//!
//! let config = GateConfig::default();
//! let pipeline = Arc::new(AuthorizationPipeline::from_config(&config)?);
//! let router = Router::new()
//!     .route("/conversations", get(list).post(create))
//!     .layer(GateLayer::new(pipeline, RouteSpec::authenticated("conversations"), config.security));
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod service;

pub use adapters::{
    InMemoryRateLimitStore, MemoryAuditSink, NoopAuditSink, SystemClock, TracingAuditSink,
};
pub use domain::config::{
    AccessWindowConfig, ConfigError, GateConfig, RateLimitConfig, RoleConfig,
    SecurityConfig,
};
pub use domain::{
    ClientIdentity, Conversation, ConversationId, Denial, DenyReason, GateError, GateResult,
    Message, MessageId, MethodClass, RateLimitInfo, RequestContext, RequestMethod, ResourceRef,
    Role, RoleScope, RouteSpec, UserId, Verdict,
};
pub use middleware::{
    sweep_task, AccessWindowGuard, AuthenticationGuard, GateLayer, GateMetrics, Guard,
    ParticipantAuthorizer, RateLimitGuard, Resource, RoleGuard, TracingLayer,
};
pub use ports::outbound::{AuditRecord, AuditSink, Clock, RateDecision, RateLimitStore};
pub use service::{AuthorizationPipeline, Evaluation, PipelineBuilder, PipelineState};

#[cfg(any(test, feature = "test-helpers"))]
pub use adapters::MockClock;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
