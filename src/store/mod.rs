//! Persistence seams for alert definitions and the audit trail
//!
//! The run only needs two narrow operations: read every alert definition of
//! a fixed partition, and write one audit record per processed alert.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::alerts::AlertDefinition;
use crate::audit::AuditRecord;

/// Source of alert definitions
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Full snapshot of the stored definitions, enabled or not
    async fn load_alerts(&self) -> Result<Vec<AlertDefinition>, StoreError>;
}

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn put_audit(&self, record: &AuditRecord) -> Result<(), StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
