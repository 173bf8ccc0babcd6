//! Guards and the HTTP middleware around the pipeline.
//!
//! Guard order: Audit → AccessWindow → RateLimit (POST only) → Authentication → Role → Handler
//!
//! The object-level [`ParticipantAuthorizer`] is not part of the ordered
//! list. Handlers call it once the target conversation or message is loaded.

pub mod access_window;
pub mod auth;
pub mod client_ip;
pub mod layer;
pub mod metrics;
pub mod participant;
pub mod rate_limit;
pub mod role;
pub mod tracing;

pub use access_window::{is_within_window, AccessWindowGuard};
pub use auth::AuthenticationGuard;
pub use client_ip::{client_ip_of, resolve_client_ip, UNKNOWN_ADDRESS};
pub use layer::{parse_target, GateLayer, GateService};
pub use metrics::GateMetrics;
pub use participant::{ParticipantAuthorizer, Resource};
pub use rate_limit::{sweep_task, RateLimitGuard};
pub use role::RoleGuard;
pub use self::tracing::{TracingLayer, TracingService};

use crate::domain::{GateResult, RequestContext, RouteSpec, Verdict};

/// One step of the pre-dispatch pipeline.
///
/// Guards are synchronous and do no I/O. `check` returns `Err` only when the
/// guard cannot reach a decision; the pipeline turns that into a
/// `GuardUnavailable` denial.
pub trait Guard: Send + Sync {
    /// Name used in logs and in [`Evaluation::guards_run`](crate::service::Evaluation).
    fn name(&self) -> &'static str;

    /// Whether this guard runs for the request at all.
    fn applies(&self, ctx: &RequestContext, route: &RouteSpec) -> bool;

    fn check(&self, ctx: &RequestContext, route: &RouteSpec) -> GateResult<Verdict>;
}
