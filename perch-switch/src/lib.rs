//! perch-switch: the tenant switch coordinator.
//!
//! Ties the pieces together: validate access, take the per-user lock with
//! a bounded wait, re-validate inside the lock, write the session context,
//! release on every path, then fire off audit and cache invalidation
//! without letting either affect the result.
//!
//! Every collaborator is an injected handle owned by process bootstrap;
//! there are no ambient singletons here.

pub mod audit;
pub mod coordinator;
pub mod invalidate;

pub use audit::{AuditDispatcher, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use coordinator::{CallerIdentity, SwitchCoordinator, SwitchOutcome, SwitchTiming};
pub use invalidate::{CacheInvalidator, NoopInvalidator, RecordingInvalidator};
