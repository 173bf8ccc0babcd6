//! # Domain Module
//!
//! Identities, resources, request context, verdicts and configuration.

pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod route;
pub mod types;

pub use config::*;
pub use context::{RequestContext, RequestContextBuilder};
pub use decision::{Denial, DenyReason, RateLimitInfo, Verdict};
pub use error::{GateError, GateResult};
pub use route::{RoleScope, RouteSpec};
pub use types::*;
