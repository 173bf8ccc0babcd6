//! Sliding-window write rate limiting per client address.
//!
//! Only write-type requests (POST) are counted. The limiter keeps no state
//! of its own; it delegates the atomic evict/count/append step to an injected
//! [`RateLimitStore`].

use crate::domain::{Denial, GateResult, RateLimitConfig, RequestContext, RouteSpec, Verdict};
use crate::middleware::Guard;
use crate::ports::outbound::{Clock, RateDecision, RateLimitStore};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Rate limit guard
#[derive(Clone)]
pub struct RateLimitGuard {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimitGuard {
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self { store, config }
    }

    /// Evict expired hits for `address`, then allow and record `now` if the
    /// address is under the limit.
    pub fn check_and_record(&self, address: IpAddr, now: Instant) -> GateResult<Verdict> {
        if self.config.whitelist.contains(&address) {
            return Ok(Verdict::Allow);
        }

        match self.store.check_and_record(
            address,
            now,
            self.config.max_requests,
            self.config.window,
        )? {
            RateDecision::Allowed { remaining } => {
                debug!(ip = %address, remaining, "Write request admitted");
                Ok(Verdict::Allow)
            }
            RateDecision::Limited => {
                warn!(
                    ip = %address,
                    limit = self.config.max_requests,
                    window_secs = self.config.window.as_secs(),
                    "Rate limit exceeded"
                );
                Ok(Verdict::Deny(Denial::rate_limited(
                    self.config.max_requests,
                    self.config.window,
                )))
            }
        }
    }

    /// Shared store handle (for the sweep task and inspection).
    pub fn store(&self) -> Arc<dyn RateLimitStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

impl std::fmt::Debug for RateLimitGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGuard")
            .field("config", &self.config)
            .field("tracked", &self.store.tracked())
            .finish()
    }
}

impl Guard for RateLimitGuard {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn applies(&self, ctx: &RequestContext, _route: &RouteSpec) -> bool {
        self.config.enabled && ctx.method().is_write()
    }

    fn check(&self, ctx: &RequestContext, _route: &RouteSpec) -> GateResult<Verdict> {
        self.check_and_record(ctx.source(), ctx.received_at())
    }
}

/// Background task removing idle rate limit entries.
pub async fn sweep_task(
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    idle_ttl: Duration,
) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let removed = store.sweep(clock.now(), idle_ttl);
        if removed > 0 {
            debug!(removed, tracked = store.tracked(), "Swept idle rate limit entries");
        }
    }
}
