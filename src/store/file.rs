//! JSON file store
//!
//! Alert definitions live in a JSON array whose items carry a `pk` partition
//! field next to the definition fields. Audit records are appended to a JSON
//! Lines file, one record per line. An item that does not decode as a
//! definition is logged and skipped; it never hides the others.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{AlertStore, AuditSink, StoreError};
use crate::alerts::AlertDefinition;
use crate::audit::AuditRecord;

/// Partition read when none is configured
pub const DEFAULT_ALERTS_PARTITION: &str = "CONFIG#ALERTS";

/// File-backed alert store and audit sink
pub struct FileStore {
    alerts_path: PathBuf,
    partition: String,
    audit_path: PathBuf,
    /// Serializes appends so records never interleave
    audit_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(alerts_path: P, audit_path: Q) -> Self {
        Self {
            alerts_path: alerts_path.as_ref().to_path_buf(),
            partition: DEFAULT_ALERTS_PARTITION.to_string(),
            audit_path: audit_path.as_ref().to_path_buf(),
            audit_lock: Mutex::new(()),
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }
}

#[async_trait]
impl AlertStore for FileStore {
    async fn load_alerts(&self) -> Result<Vec<AlertDefinition>, StoreError> {
        let contents = tokio::fs::read_to_string(&self.alerts_path).await?;
        let items: Vec<Value> = serde_json::from_str(&contents)?;

        let mut alerts = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if item.get("pk").and_then(Value::as_str) != Some(self.partition.as_str()) {
                continue;
            }

            let station_id = item.get("stationId").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<AlertDefinition>(item) {
                Ok(alert) => alerts.push(alert),
                Err(e) => {
                    tracing::warn!(
                        index,
                        station_id = %station_id,
                        error = %e,
                        "Skipping malformed alert definition"
                    );
                }
            }
        }

        Ok(alerts)
    }
}

#[async_trait]
impl AuditSink for FileStore {
    async fn put_audit(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.audit_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, AuditRecorder};
    use crate::measurement::Measurement;
    use std::sync::Arc;

    const ALERTS: &str = r#"[
        {"pk": "CONFIG#ALERTS", "sk": "ALERT#150160180#high", "stationId": "150160180",
         "minLevel": 235, "maxLevel": 260, "enabled": true, "channelTarget": "-100123",
         "displayName": "Kraków"},
        {"pk": "CONFIG#ALERTS", "stationId": "152210170",
         "minLevel": 100, "maxLevel": 200, "enabled": false, "channelTarget": 77},
        {"pk": "OTHER", "stationId": "999", "minLevel": 0, "maxLevel": 1,
         "enabled": true, "channelTarget": "1"}
    ]"#;

    #[tokio::test]
    async fn test_load_filters_partition() {
        let dir = tempfile::tempdir().unwrap();
        let alerts_path = dir.path().join("alerts.json");
        std::fs::write(&alerts_path, ALERTS).unwrap();

        let store = FileStore::new(&alerts_path, dir.path().join("audit.jsonl"));
        let alerts = store.load_alerts().await.unwrap();

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].alert_id(), "high");
        assert_eq!(alerts[0].display_name.as_deref(), Some("Kraków"));
        assert_eq!(alerts[1].channel_target, "77");
        assert!(!alerts[1].enabled);

        let other = FileStore::new(&alerts_path, dir.path().join("audit.jsonl")).with_partition("OTHER");
        assert_eq!(other.load_alerts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("missing.json"), dir.path().join("audit.jsonl"));

        let err = tokio_test::assert_err!(store.load_alerts().await);
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let alerts_path = dir.path().join("alerts.json");
        std::fs::write(&alerts_path, "{not json").unwrap();

        let store = FileStore::new(&alerts_path, dir.path().join("audit.jsonl"));
        let err = tokio_test::assert_err!(store.load_alerts().await);
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_malformed_item_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let alerts_path = dir.path().join("alerts.json");
        std::fs::write(
            &alerts_path,
            r#"[
                {"pk": "CONFIG#ALERTS", "stationId": "150160180", "minLevel": 235,
                 "maxLevel": 260, "enabled": true, "channelTarget": "-100123"},
                {"pk": "CONFIG#ALERTS", "stationId": "152210170", "minLevel": 100,
                 "maxLevel": 200, "channelTarget": "-100777"},
                {"pk": "CONFIG#ALERTS", "stationId": 151140030, "minLevel": 1,
                 "maxLevel": 2, "enabled": true, "channelTarget": "-100888"}
            ]"#,
        )
        .unwrap();

        let store = FileStore::new(&alerts_path, dir.path().join("audit.jsonl"));
        let alerts = tokio_test::assert_ok!(store.load_alerts().await);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].station_id, "150160180");
    }

    #[tokio::test]
    async fn test_audit_records_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let audit_path = dir.path().join("audit.jsonl");
        let store = Arc::new(FileStore::new(dir.path().join("alerts.json"), &audit_path));
        let recorder = AuditRecorder::new(store);

        let alert = AlertDefinition::new("150160180", 235.0, 260.0, "1");
        let m = Measurement::new(245.5, "2026-02-06T10:00:00Z");
        let first = tokio_test::assert_ok!(recorder.persist(AuditEvent::sent(&alert, &m, "42")).await);
        let second = tokio_test::assert_ok!(recorder.persist(AuditEvent::skipped(&alert, &m, false)).await);

        let contents = std::fs::read_to_string(&audit_path).unwrap();
        let lines: Vec<AuditRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines, vec![first, second]);
    }
}
