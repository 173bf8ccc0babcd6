//! Adapters implementing the outbound ports.

pub mod audit;
pub mod clock;
pub mod memory_store;

pub use audit::{MemoryAuditSink, NoopAuditSink, TracingAuditSink};
pub use clock::SystemClock;
pub use memory_store::InMemoryRateLimitStore;

#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
