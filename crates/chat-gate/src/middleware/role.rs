//! Role check, attached only to route groups that ask for it.

use crate::domain::{
    Denial, GateResult, RequestContext, Role, RoleConfig, RoleScope, RouteSpec, Verdict,
};
use crate::middleware::Guard;
use std::collections::HashSet;
use tracing::debug;

/// Admits callers whose role is in the privileged set (admin and moderator
/// by default) or in the route's explicit set.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    privileged: HashSet<Role>,
}

impl RoleGuard {
    pub fn new(config: &RoleConfig) -> Self {
        Self {
            privileged: config.privileged.iter().copied().collect(),
        }
    }

    /// Decide against the privileged set.
    pub fn evaluate(&self, role: Role) -> Verdict {
        Self::evaluate_in(&self.privileged, role)
    }

    fn evaluate_in(allowed: &HashSet<Role>, role: Role) -> Verdict {
        if allowed.contains(&role) {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::insufficient_role())
        }
    }

    pub fn privileged(&self) -> &HashSet<Role> {
        &self.privileged
    }
}

impl Default for RoleGuard {
    fn default() -> Self {
        Self::new(&RoleConfig::default())
    }
}

impl Guard for RoleGuard {
    fn name(&self) -> &'static str {
        "role"
    }

    fn applies(&self, _ctx: &RequestContext, route: &RouteSpec) -> bool {
        route.requires_roles()
    }

    fn check(&self, ctx: &RequestContext, route: &RouteSpec) -> GateResult<Verdict> {
        // Normally unreachable: authentication runs first on role routes
        let Some(identity) = ctx.authenticated_identity() else {
            return Ok(Verdict::Deny(Denial::unauthenticated()));
        };

        let verdict = match &route.roles {
            RoleScope::Any => Verdict::Allow,
            RoleScope::Privileged => self.evaluate(identity.role),
            RoleScope::Only(roles) => Self::evaluate_in(roles, identity.role),
        };
        debug!(
            user = %identity.id,
            role = %identity.role,
            route = route.name,
            allowed = verdict.is_allow(),
            "Role evaluated"
        );
        Ok(verdict)
    }
}
