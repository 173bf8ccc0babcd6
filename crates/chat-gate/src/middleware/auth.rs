//! Authentication requirement for route groups.
//!
//! Credentials are validated upstream. This guard only checks that the
//! identity placed on the request is present and marked authenticated.

use crate::domain::{Denial, GateResult, RequestContext, RouteSpec, Verdict};
use crate::middleware::Guard;
use tracing::debug;

/// Denies with `Unauthenticated` on routes that require an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationGuard;

impl AuthenticationGuard {
    pub fn new() -> Self {
        Self
    }
}

impl Guard for AuthenticationGuard {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn applies(&self, _ctx: &RequestContext, route: &RouteSpec) -> bool {
        route.requires_auth || route.requires_roles()
    }

    fn check(&self, ctx: &RequestContext, route: &RouteSpec) -> GateResult<Verdict> {
        match ctx.authenticated_identity() {
            Some(identity) => {
                debug!(user = %identity.id, route = route.name, "Identity present");
                Ok(Verdict::Allow)
            }
            None => Ok(Verdict::Deny(Denial::unauthenticated())),
        }
    }
}
