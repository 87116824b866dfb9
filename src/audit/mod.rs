//! Audit trail of alert-processing attempts
//!
//! Every processed alert yields exactly one immutable event per run.
//! Retention is enforced outside this crate through the expiry marker.

pub mod event;
pub mod recorder;

pub use event::{AuditEvent, AuditStatus, Outcome};
pub use recorder::{AuditRecord, AuditRecorder};
