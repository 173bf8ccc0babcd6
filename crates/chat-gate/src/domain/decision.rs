//! Guard verdicts and the structured denial returned to callers.
//!
//! | Reason               | Status | Code                   |
//! |----------------------|--------|------------------------|
//! | `Unauthenticated`    | 401    | `unauthenticated`      |
//! | `AccessWindowClosed` | 403    | `access_window_closed` |
//! | `RateLimited`        | 429    | `rate_limited`         |
//! | `InsufficientRole`   | 403    | `insufficient_role`    |
//! | `NotParticipant`     | 403    | `not_participant`      |
//! | `NotOwner`           | 403    | `not_owner`            |
//! | `GuardUnavailable`   | 503    | `guard_unavailable`    |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status codes used by the HTTP adapter.
pub mod status {
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const TOO_MANY_REQUESTS: u16 = 429;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    AccessWindowClosed,
    RateLimited,
    InsufficientRole,
    NotParticipant,
    NotOwner,
    /// A guard failed to reach a decision; the request fails closed.
    GuardUnavailable,
}

impl DenyReason {
    pub const ALL: [DenyReason; 7] = [
        DenyReason::Unauthenticated,
        DenyReason::AccessWindowClosed,
        DenyReason::RateLimited,
        DenyReason::InsufficientRole,
        DenyReason::NotParticipant,
        DenyReason::NotOwner,
        DenyReason::GuardUnavailable,
    ];

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::AccessWindowClosed => "access_window_closed",
            DenyReason::RateLimited => "rate_limited",
            DenyReason::InsufficientRole => "insufficient_role",
            DenyReason::NotParticipant => "not_participant",
            DenyReason::NotOwner => "not_owner",
            DenyReason::GuardUnavailable => "guard_unavailable",
        }
    }

    /// Transport status the reason maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            DenyReason::Unauthenticated => status::UNAUTHORIZED,
            DenyReason::RateLimited => status::TOO_MANY_REQUESTS,
            DenyReason::GuardUnavailable => status::SERVICE_UNAVAILABLE,
            DenyReason::AccessWindowClosed
            | DenyReason::InsufficientRole
            | DenyReason::NotParticipant
            | DenyReason::NotOwner => status::FORBIDDEN,
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Rate limit details attached to a `RateLimited` denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: usize,
    pub window: Duration,
    pub retry_after: Duration,
}

/// A structured denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenyReason,
    pub message: String,
    pub rate_limit: Option<RateLimitInfo>,
}

impl Denial {
    pub fn new(reason: DenyReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            rate_limit: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            DenyReason::Unauthenticated,
            "Authentication credentials were not provided.",
        )
    }

    /// Outside the access band. The message names the default band because
    /// that is what clients of the original service were shown.
    pub fn access_window_closed(open_hour: u8, close_hour: u8) -> Self {
        Self::new(
            DenyReason::AccessWindowClosed,
            format!(
                "Access is restricted to ({} - {}).",
                clock_label(open_hour),
                clock_label(close_hour)
            ),
        )
    }

    pub fn rate_limited(limit: usize, window: Duration) -> Self {
        let per = if window == Duration::from_secs(60) {
            "minute".to_string()
        } else {
            format!("{} seconds", window.as_secs())
        };
        Self {
            reason: DenyReason::RateLimited,
            message: format!("Maximum {} messages per {} allowed", limit, per),
            rate_limit: Some(RateLimitInfo {
                limit,
                window,
                retry_after: window,
            }),
        }
    }

    pub fn insufficient_role() -> Self {
        Self::new(
            DenyReason::InsufficientRole,
            "You do not have permission to perform this action.",
        )
    }

    pub fn not_participant() -> Self {
        Self::new(
            DenyReason::NotParticipant,
            "You are not a participant in this conversation.",
        )
    }

    pub fn not_owner() -> Self {
        Self::new(
            DenyReason::NotOwner,
            "Only the sender can modify this message.",
        )
    }

    pub fn guard_unavailable() -> Self {
        Self::new(
            DenyReason::GuardUnavailable,
            "Request could not be authorized.",
        )
    }

    pub fn status_code(&self) -> u16 {
        self.reason.status_code()
    }

    /// Retry hint, only present for rate limiting.
    pub fn retry_after(&self) -> Option<Duration> {
        self.rate_limit.map(|info| info.retry_after)
    }

    /// JSON body sent to clients.
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.reason.code(),
            "message": self.message,
        });
        if let Some(info) = &self.rate_limit {
            body["limit"] = serde_json::json!(info.limit);
            body["window_secs"] = serde_json::json!(info.window.as_secs());
            body["retry_after"] =
                serde_json::json!(format!("{} seconds", info.retry_after.as_secs()));
        }
        body
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.reason.code(), self.message)
    }
}

impl Serialize for Denial {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_body().serialize(serializer)
    }
}

/// Outcome of a single guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn is_deny(&self) -> bool {
        !self.is_allow()
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny(denial) => Some(denial.reason),
        }
    }

    /// Convert into a `Result` so handlers can use `?`.
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Verdict::Allow => Ok(()),
            Verdict::Deny(denial) => Err(denial),
        }
    }
}

/// "9 PM", "6 AM", "12 AM"
fn clock_label(hour: u8) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{} {}", display, suffix)
}
