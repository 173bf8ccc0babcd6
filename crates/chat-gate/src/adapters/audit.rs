//! Audit sink adapters.

use crate::ports::outbound::{AuditRecord, AuditSink};
use parking_lot::Mutex;

/// Writes each record as an `info` event on the `request_audit` target.
///
/// Route the target to a file or log shipper through the subscriber's
/// filter, e.g. `RUST_LOG=request_audit=info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: "request_audit",
            user = %record.user,
            path = %record.path,
            "{}",
            record.line()
        );
    }
}

/// Discards records. Default sink of hand-built pipelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: AuditRecord) {}
}

/// Keeps records in memory. Useful for tests and debugging endpoints.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}
