//! Pipeline counters, exported as JSON or (with the `metrics` feature) in the
//! Prometheus text format.

use crate::domain::DenyReason;
use std::sync::atomic::{AtomicU64, Ordering};

/// Gate metrics
#[derive(Debug, Default)]
pub struct GateMetrics {
    pub requests_total: AtomicU64,
    pub allowed_total: AtomicU64,
    pub denied_total: AtomicU64,
    pub audit_records_total: AtomicU64,
    /// Object-level decisions made by handlers
    pub resource_checks_total: AtomicU64,
    denials: [AtomicU64; DenyReason::ALL.len()],
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_audit(&self) {
        self.audit_records_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_allowed(&self) {
        self.allowed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self, reason: DenyReason) {
        self.denied_total.fetch_add(1, Ordering::Relaxed);
        self.denials[slot(reason)].fetch_add(1, Ordering::Relaxed);
    }

    /// Record an object-level decision. Denials also count per reason.
    pub fn record_resource_check(&self, denied: Option<DenyReason>) {
        self.resource_checks_total.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = denied {
            self.denials[slot(reason)].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn denials_for(&self, reason: DenyReason) -> u64 {
        self.denials[slot(reason)].load(Ordering::Relaxed)
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        let denials: serde_json::Map<String, serde_json::Value> = DenyReason::ALL
            .iter()
            .map(|reason| (reason.code().to_string(), self.denials_for(*reason).into()))
            .collect();

        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "allowed": self.allowed_total.load(Ordering::Relaxed),
                "denied": self.denied_total.load(Ordering::Relaxed),
            },
            "denials": denials,
            "audit_records": self.audit_records_total.load(Ordering::Relaxed),
            "resource_checks": self.resource_checks_total.load(Ordering::Relaxed),
        })
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn to_prometheus(&self) -> Result<String, prometheus::Error> {
        use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

        let registry = Registry::new();

        let counters = [
            ("chat_gate_requests_total", "Requests evaluated", &self.requests_total),
            ("chat_gate_allowed_total", "Requests allowed by every guard", &self.allowed_total),
            ("chat_gate_denied_total", "Requests denied before dispatch", &self.denied_total),
            ("chat_gate_audit_records_total", "Audit records written", &self.audit_records_total),
            (
                "chat_gate_resource_checks_total",
                "Object-level authorization decisions",
                &self.resource_checks_total,
            ),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::new(name, help)?;
            counter.inc_by(value.load(Ordering::Relaxed));
            registry.register(Box::new(counter))?;
        }

        let denials = IntCounterVec::new(
            Opts::new("chat_gate_denials_total", "Denials by reason"),
            &["reason"],
        )?;
        for reason in DenyReason::ALL {
            denials
                .with_label_values(&[reason.code()])
                .inc_by(self.denials_for(reason));
        }
        registry.register(Box::new(denials))?;

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn slot(reason: DenyReason) -> usize {
    match reason {
        DenyReason::Unauthenticated => 0,
        DenyReason::AccessWindowClosed => 1,
        DenyReason::RateLimited => 2,
        DenyReason::InsufficientRole => 3,
        DenyReason::NotParticipant => 4,
        DenyReason::NotOwner => 5,
        DenyReason::GuardUnavailable => 6,
    }
}
