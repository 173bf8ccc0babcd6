//! Time-of-day access window.
//!
//! Traffic is only admitted inside a fixed band of wall-clock hours,
//! 21:00 to 05:59 by default. Pure function of the hour; no shared state.

use crate::domain::{AccessWindowConfig, Denial, GateResult, RequestContext, RouteSpec, Verdict};
use crate::middleware::Guard;
use chrono::Timelike;
use tracing::debug;

/// True if `hour` falls in the band `[open, close)`, wrapping midnight when
/// `open > close`.
pub fn is_within_window(hour: u32, open: u8, close: u8) -> bool {
    let (open, close) = (u32::from(open), u32::from(close));
    if open > close {
        hour >= open || hour < close
    } else {
        hour >= open && hour < close
    }
}

/// Access window guard
#[derive(Debug, Clone)]
pub struct AccessWindowGuard {
    config: AccessWindowConfig,
}

impl AccessWindowGuard {
    pub fn new(config: AccessWindowConfig) -> Self {
        Self { config }
    }

    /// Decide for an hour of the day. Hours outside 0..=23 are denied.
    pub fn evaluate(&self, hour: u32) -> Verdict {
        if hour < 24 && is_within_window(hour, self.config.open_hour, self.config.close_hour) {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::access_window_closed(
                self.config.open_hour,
                self.config.close_hour,
            ))
        }
    }
}

impl Default for AccessWindowGuard {
    fn default() -> Self {
        Self::new(AccessWindowConfig::default())
    }
}

impl Guard for AccessWindowGuard {
    fn name(&self) -> &'static str {
        "access_window"
    }

    fn applies(&self, _ctx: &RequestContext, _route: &RouteSpec) -> bool {
        self.config.enabled
    }

    fn check(&self, ctx: &RequestContext, _route: &RouteSpec) -> GateResult<Verdict> {
        let hour = ctx.wall_time().hour();
        let verdict = self.evaluate(hour);
        debug!(hour, allowed = verdict.is_allow(), "Access window evaluated");
        Ok(verdict)
    }
}
