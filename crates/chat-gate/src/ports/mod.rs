//! # Ports
//!
//! Outbound traits implemented by adapters (clock, audit sink, rate limit
//! store). The inbound side is the [`Guard`](crate::middleware::Guard) trait
//! and the [`AuthorizationPipeline`](crate::service::AuthorizationPipeline).

pub mod outbound;

pub use outbound::{AuditRecord, AuditSink, Clock, RateDecision, RateLimitStore};
