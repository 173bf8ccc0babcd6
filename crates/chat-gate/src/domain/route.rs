//! Per-route guard requirements.
//!
//! Role checks are attached to route groups, never applied globally: ordinary
//! users must still be able to read and post in their own conversations.

use crate::domain::types::Role;
use std::collections::HashSet;

/// Role requirement of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RoleScope {
    /// No role check
    #[default]
    Any,
    /// The configured privileged set (admin and moderator by default)
    Privileged,
    /// An explicit set for this route only
    Only(HashSet<Role>),
}

/// Which route-scoped guards apply to a group of routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSpec {
    /// Route name used in logs
    pub name: &'static str,
    /// Require an authenticated identity
    pub requires_auth: bool,
    pub roles: RoleScope,
}

impl RouteSpec {
    /// No route-scoped guards.
    pub fn public(name: &'static str) -> Self {
        Self {
            name,
            requires_auth: false,
            roles: RoleScope::Any,
        }
    }

    /// Authenticated callers of any role.
    pub fn authenticated(name: &'static str) -> Self {
        Self {
            name,
            requires_auth: true,
            roles: RoleScope::Any,
        }
    }

    /// Restrict to the configured privileged roles. Implies authentication.
    pub fn privileged(name: &'static str) -> Self {
        Self {
            name,
            requires_auth: true,
            roles: RoleScope::Privileged,
        }
    }

    /// Restrict to an explicit role set. Implies authentication.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.requires_auth = true;
        self.roles = RoleScope::Only(roles.into_iter().collect());
        self
    }

    pub fn requires_roles(&self) -> bool {
        !matches!(self.roles, RoleScope::Any)
    }
}
