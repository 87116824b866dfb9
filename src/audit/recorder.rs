//! Persisting audit events

use std::sync::{Arc, OnceLock};

use chrono::{Duration, SecondsFormat};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::event::AuditEvent;
use crate::store::{AuditSink, StoreError};

/// An audit event with its store keys and optional expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// `ALERT#<stationId>#<alertId>`
    pub pk: String,
    /// `MEASUREMENT#<timestamp>#<suffix>`
    pub sk: String,
    #[serde(flatten)]
    pub event: AuditEvent,
    /// Expiry marker (unix seconds) for externally enforced retention
    #[serde(default, rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Writes audit events to an [`AuditSink`]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    retention: Option<Duration>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            retention: None,
        }
    }

    /// Stamp every record with an expiry `retention` after the attempt
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention
    }

    /// Attach keys and expiry to an event
    pub fn build_record(&self, event: AuditEvent) -> AuditRecord {
        let timestamp = match event.measurement_time {
            Some(at) => at.to_rfc3339_opts(SecondsFormat::Secs, true),
            None => event.measurement_time_raw.clone(),
        };

        AuditRecord {
            pk: partition_key(&event.station_id, &event.alert_id),
            sk: sort_key(&timestamp, &random_suffix()),
            expires_at: self.retention.and_then(|retention| expiry(&event, retention)),
            event,
        }
    }

    /// Write one event. The error is returned to the caller, never dropped here.
    pub async fn persist(&self, event: AuditEvent) -> Result<AuditRecord, StoreError> {
        let record = self.build_record(event);
        self.sink.put_audit(&record).await?;
        Ok(record)
    }
}

/// Unix expiry `retention` after the attempt. A window past the representable
/// date range leaves the record without expiry.
fn expiry(event: &AuditEvent, retention: Duration) -> Option<i64> {
    match event.attempted_at.checked_add_signed(retention) {
        Some(at) => Some(at.timestamp()),
        None => {
            tracing::warn!(
                station_id = %event.station_id,
                alert_id = %event.alert_id,
                retention_days = retention.num_days(),
                "Audit retention overflows the date range, record will not expire"
            );
            None
        }
    }
}

/// Partition key of an alert's audit trail
pub fn partition_key(station_id: &str, alert_id: &str) -> String {
    let alert_id = if alert_id.is_empty() {
        crate::alerts::DEFAULT_ALERT_ID
    } else {
        alert_id
    };
    format!("ALERT#{}#{}", station_id, alert_id)
}

/// Sort key ordering attempts by measurement time
pub fn sort_key(timestamp: &str, suffix: &str) -> String {
    format!("MEASUREMENT#{}#{}", sanitize_timestamp(timestamp), suffix)
}

/// Replace characters that would clash with the key delimiter
fn sanitize_timestamp(timestamp: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^0-9A-Za-z:.+\-]").expect("valid regex"));

    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return "unknown".to_string();
    }
    unsafe_chars.replace_all(trimmed, "_").into_owned()
}

/// Disambiguates attempts that share a measurement timestamp
fn random_suffix() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertDefinition;
    use crate::measurement::Measurement;
    use crate::store::MemoryStore;

    fn alert() -> AlertDefinition {
        AlertDefinition::new("150160180", 235.0, 260.0, "-100123").with_alert_id("flood")
    }

    #[test]
    fn test_keys() {
        assert_eq!(partition_key("150160180", "flood"), "ALERT#150160180#flood");
        assert_eq!(partition_key("150160180", ""), "ALERT#150160180#default");
        assert_eq!(
            sort_key("2026-02-06T10:00:00Z", "0000abcd"),
            "MEASUREMENT#2026-02-06T10:00:00Z#0000abcd"
        );
        assert_eq!(
            sort_key("06/02/2026 10:00 #1", "0000abcd"),
            "MEASUREMENT#06_02_2026_10:00__1#0000abcd"
        );
        assert_eq!(sort_key("  ", "0000abcd"), "MEASUREMENT#unknown#0000abcd");
    }

    #[test]
    fn test_build_record_uses_normalized_time() {
        let recorder = AuditRecorder::new(Arc::new(MemoryStore::new()));
        let m = Measurement::new(245.5, "2026-02-06 10:00:00");
        let record = recorder.build_record(AuditEvent::sent(&alert(), &m, "42"));

        assert_eq!(record.pk, "ALERT#150160180#flood");
        assert!(record.sk.starts_with("MEASUREMENT#2026-02-06T10:00:00Z#"));
        assert_eq!(record.expires_at, None);
    }

    #[test]
    fn test_sort_keys_are_unique_for_same_timestamp() {
        let recorder = AuditRecorder::new(Arc::new(MemoryStore::new()));
        let m = Measurement::new(245.5, "2026-02-06T10:00:00Z");

        let a = recorder.build_record(AuditEvent::skipped(&alert(), &m, false));
        let b = recorder.build_record(AuditEvent::skipped(&alert(), &m, false));
        assert_eq!(a.pk, b.pk);
        assert_ne!(a.sk, b.sk);
    }

    #[test]
    fn test_retention_sets_expiry() {
        let recorder =
            AuditRecorder::new(Arc::new(MemoryStore::new())).with_retention(Duration::days(30));
        let m = Measurement::new(245.5, "2026-02-06T10:00:00Z");
        let event = AuditEvent::skipped(&alert(), &m, false);
        let attempted_at = event.attempted_at;

        let record = recorder.build_record(event);
        assert_eq!(
            record.expires_at,
            Some((attempted_at + Duration::days(30)).timestamp())
        );
    }

    #[tokio::test]
    async fn test_overflowing_retention_leaves_no_expiry() {
        let config = crate::config::AppConfig::from_lookup(|name| {
            (name == "HYDROALERT_AUDIT_RETENTION_DAYS").then(|| "4000000000".to_string())
        });
        let retention = config.audit_retention().unwrap();

        let store = Arc::new(MemoryStore::new());
        let recorder = AuditRecorder::new(store.clone()).with_retention(retention);
        let m = Measurement::new(245.5, "2026-02-06T10:00:00Z");

        let record = tokio_test::assert_ok!(recorder.persist(AuditEvent::sent(&alert(), &m, "42")).await);
        assert_eq!(record.expires_at, None);
        assert_eq!(store.audit_records().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_writes_to_sink() {
        let store = Arc::new(MemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());
        let m = Measurement::new(245.5, "2026-02-06T10:00:00Z");

        let record = recorder
            .persist(AuditEvent::sent(&alert(), &m, "42"))
            .await
            .unwrap();

        let stored = store.audit_records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], record);
    }
}
