//! Hydroalert: Scheduled Water-Level Threshold Alerts
//!
//! Polls a public hydrological API for the latest reading of each monitored
//! station, compares it against user-defined level ranges and sends a chat
//! notification on a match. Every attempt leaves an audit record.
//!
//! # Features
//!
//! - **Threshold Evaluation**: Inclusive `[min, max]` ranges, no tolerance
//! - **Measurement Client**: Bounded-time fetch with lenient value parsing
//! - **Notification Dispatch**: Bot API delivery with a cached credential
//! - **Audit Trail**: One immutable `SENT`/`FAILED`/`SKIPPED` event per alert per run
//! - **Failure Isolation**: One broken station never aborts the run
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hydroalert::alerts::AlertDefinition;
//! use hydroalert::audit::AuditRecorder;
//! use hydroalert::measurement::{MeasurementClient, MeasurementConfig};
//! use hydroalert::notify::{CredentialCache, EnvSecretSource, TelegramDispatcher};
//! use hydroalert::orchestrator::RunOrchestrator;
//! use hydroalert::store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::with_alerts([
//!     AlertDefinition::new("150160180", 235.0, 260.0, "-1001234567").with_display_name("Kraków"),
//! ]));
//! let source = Arc::new(MeasurementClient::new(MeasurementConfig::default())?);
//! let credentials = Arc::new(CredentialCache::new(Arc::new(EnvSecretSource), "TELEGRAM_BOT_TOKEN"));
//! let channel = Arc::new(TelegramDispatcher::new(credentials)?);
//!
//! let orchestrator = RunOrchestrator::new(store.clone(), source, channel, AuditRecorder::new(store));
//! let summary = orchestrator.run().await?;
//! println!("sent {} notifications", summary.sent);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod audit;
pub mod config;
pub mod measurement;
pub mod notify;
pub mod orchestrator;
pub mod store;

// Re-export commonly used types
pub use alerts::{evaluate, AlertDefinition};
pub use audit::{AuditEvent, AuditRecord, AuditRecorder, AuditStatus, Outcome};
pub use measurement::{Measurement, MeasurementClient, MeasurementError};
pub use orchestrator::{RunError, RunOrchestrator, RunSummary};
pub use store::{AlertStore, AuditSink, StoreError};
