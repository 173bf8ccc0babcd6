//! Immutable snapshot of one inbound request.

use crate::domain::types::{ClientIdentity, RequestMethod, ResourceRef};
use crate::ports::outbound::Clock;
use chrono::{DateTime, Local};
use std::net::IpAddr;
use std::time::Instant;

/// Everything the guards need to know about a request.
///
/// Built once per request and shared read-only afterwards. Two timestamps
/// are captured from the same [`Clock`] reading: a monotonic instant for
/// interval arithmetic (rate limiting) and a wall-clock time for the access
/// window and the audit trail.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: RequestMethod,
    source: IpAddr,
    received_at: Instant,
    wall_time: DateTime<Local>,
    identity: Option<ClientIdentity>,
    target: Option<ResourceRef>,
    path: String,
}

impl RequestContext {
    /// Start building a context stamped with the clock's current time.
    pub fn builder(
        method: RequestMethod,
        source: IpAddr,
        clock: &dyn Clock,
    ) -> RequestContextBuilder {
        RequestContextBuilder {
            method,
            source,
            received_at: clock.now(),
            wall_time: clock.wall_time(),
            identity: None,
            target: None,
            path: String::from("/"),
        }
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Resolved client address (see [`crate::middleware::client_ip`]).
    pub fn source(&self) -> IpAddr {
        self.source
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    pub fn wall_time(&self) -> DateTime<Local> {
        self.wall_time
    }

    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// The identity, only if it is marked authenticated.
    pub fn authenticated_identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref().filter(|identity| identity.authenticated)
    }

    pub fn target(&self) -> Option<ResourceRef> {
        self.target
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug)]
pub struct RequestContextBuilder {
    method: RequestMethod,
    source: IpAddr,
    received_at: Instant,
    wall_time: DateTime<Local>,
    identity: Option<ClientIdentity>,
    target: Option<ResourceRef>,
    path: String,
}

impl RequestContextBuilder {
    pub fn identity(mut self, identity: Option<ClientIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn target(mut self, target: Option<ResourceRef>) -> Self {
        self.target = target;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn build(self) -> RequestContext {
        RequestContext {
            method: self.method,
            source: self.source,
            received_at: self.received_at,
            wall_time: self.wall_time,
            identity: self.identity,
            target: self.target,
            path: self.path,
        }
    }
}
