//! # Outbound Ports
//!
//! Collaborators the pipeline depends on: time, the audit trail, and the
//! rate limit state store.

use crate::domain::GateResult;
use chrono::{DateTime, Local};
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Time source.
///
/// `now` is monotonic and is the only value used for interval arithmetic.
/// `wall_time` is for the access window and for display.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn wall_time(&self) -> DateTime<Local>;
}

/// One audit entry, written for every request before any guard runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Local>,
    /// Identity label, or `"Anonymous"`
    pub user: String,
    pub path: String,
}

impl AuditRecord {
    pub const ANONYMOUS: &'static str = "Anonymous";

    /// `"{timestamp} - User: {user} - Path: {path}"`
    pub fn line(&self) -> String {
        format!(
            "{} - User: {} - Path: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
            self.user,
            self.path
        )
    }
}

/// Audit trail sink. Recording never fails the request.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Result of a rate limit store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Recorded; `remaining` slots left in the current window
    Allowed { remaining: usize },
    /// Limit reached; nothing recorded
    Limited,
}

/// Per-address sliding-window state.
///
/// `check_and_record` must evict, count and conditionally append as one
/// atomic step per key. Implementations backed by a shared external store
/// let several processes enforce one global limit.
pub trait RateLimitStore: Send + Sync {
    fn check_and_record(
        &self,
        key: IpAddr,
        now: Instant,
        limit: usize,
        window: Duration,
    ) -> GateResult<RateDecision>;

    /// Number of instants currently recorded for `key` (no eviction).
    fn recorded(&self, key: IpAddr) -> usize;

    /// Drop keys idle for longer than `idle_ttl`. Returns how many were removed.
    fn sweep(&self, now: Instant, idle_ttl: Duration) -> usize;

    /// Number of tracked keys.
    fn tracked(&self) -> usize;
}
