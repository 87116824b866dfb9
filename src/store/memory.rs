//! In-memory store

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{AlertStore, AuditSink, StoreError};
use crate::alerts::AlertDefinition;
use crate::audit::AuditRecord;

/// Alert definitions and audit records held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Definitions keyed by (station id, alert id)
    alerts: DashMap<(String, String), AlertDefinition>,
    /// Audit records in write order
    audit: RwLock<Vec<AuditRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a preloaded set of definitions
    pub fn with_alerts(alerts: impl IntoIterator<Item = AlertDefinition>) -> Self {
        let store = Self::new();
        for alert in alerts {
            store.insert_alert(alert);
        }
        store
    }

    /// Insert or replace a definition, returning the previous one
    pub fn insert_alert(&self, alert: AlertDefinition) -> Option<AlertDefinition> {
        let key = (alert.station_id.clone(), alert.alert_id().to_string());
        self.alerts.insert(key, alert)
    }

    pub fn remove_alert(&self, station_id: &str, alert_id: &str) -> Option<AlertDefinition> {
        self.alerts
            .remove(&(station_id.to_string(), alert_id.to_string()))
            .map(|(_, alert)| alert)
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    /// Snapshot of everything written so far
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit.read().clone()
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn load_alerts(&self) -> Result<Vec<AlertDefinition>, StoreError> {
        let mut alerts: Vec<_> = self
            .alerts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        alerts.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(alerts.into_iter().map(|(_, alert)| alert).collect())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn put_audit(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.audit.write().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_is_sorted_and_keyed() {
        let store = MemoryStore::with_alerts([
            AlertDefinition::new("b", 0.0, 1.0, "1"),
            AlertDefinition::new("a", 0.0, 1.0, "1").with_alert_id("high"),
            AlertDefinition::new("a", 0.0, 1.0, "1").with_alert_id("low"),
        ]);

        let loaded = store.load_alerts().await.unwrap();
        let ids: Vec<_> = loaded
            .iter()
            .map(|a| format!("{}/{}", a.station_id, a.alert_id()))
            .collect();
        assert_eq!(ids, vec!["a/high", "a/low", "b/default"]);
    }

    #[test]
    fn test_insert_replaces_same_identity() {
        let store = MemoryStore::new();
        assert!(store.insert_alert(AlertDefinition::new("a", 0.0, 1.0, "1")).is_none());

        let previous = store.insert_alert(AlertDefinition::new("a", 5.0, 6.0, "1"));
        assert_eq!(previous.map(|a| a.min_level), Some(0.0));
        assert_eq!(store.alert_count(), 1);

        assert!(store.remove_alert("a", "default").is_some());
        assert_eq!(store.alert_count(), 0);
    }
}
