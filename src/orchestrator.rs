//! Run orchestration
//!
//! One run loads every alert definition, drops disabled ones and drives each
//! remaining alert through fetch, evaluate, dispatch and record. Alerts are
//! processed sequentially and in isolation: whatever happens to one alert is
//! captured in its audit event and never stops the others. Only a failure to
//! load the definitions aborts the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::{FixedOffset, Offset, Utc};

use crate::alerts::{evaluate, AlertDefinition};
use crate::audit::{AuditEvent, AuditRecorder, AuditStatus};
use crate::measurement::{Measurement, MeasurementSource};
use crate::notify::{format_alert_message, NotificationChannel, OutboundMessage};
use crate::store::{AlertStore, StoreError};

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Definitions returned by the store
    pub loaded: usize,
    /// Definitions left after dropping disabled ones
    pub enabled: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Audit events that could not be written
    pub audit_write_failures: usize,
}

impl RunSummary {
    fn count(&mut self, status: AuditStatus) {
        match status {
            AuditStatus::Sent => self.sent += 1,
            AuditStatus::Failed => self.failed += 1,
            AuditStatus::Skipped => self.skipped += 1,
        }
    }

    /// Alerts that went through processing
    pub fn processed(&self) -> usize {
        self.sent + self.failed + self.skipped
    }
}

/// Drives one run over all enabled alert definitions
pub struct RunOrchestrator {
    store: Arc<dyn AlertStore>,
    source: Arc<dyn MeasurementSource>,
    channel: Arc<dyn NotificationChannel>,
    recorder: AuditRecorder,
    display_offset: FixedOffset,
}

impl RunOrchestrator {
    pub fn new(
        store: Arc<dyn AlertStore>,
        source: Arc<dyn MeasurementSource>,
        channel: Arc<dyn NotificationChannel>,
        recorder: AuditRecorder,
    ) -> Self {
        Self {
            store,
            source,
            channel,
            recorder,
            display_offset: Utc.fix(),
        }
    }

    /// Offset used to render times in notifications
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// Execute one run
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let started = Instant::now();

        let definitions = self.store.load_alerts().await.map_err(RunError::Load)?;
        let loaded = definitions.len();

        let active: Vec<AlertDefinition> = definitions.into_iter().filter(|a| a.enabled).collect();

        let mut summary = RunSummary {
            loaded,
            enabled: active.len(),
            ..Default::default()
        };

        if active.is_empty() {
            tracing::info!(loaded, "No enabled alerts, nothing to do");
            return Ok(summary);
        }

        for alert in &active {
            let event = self.process_alert(alert).await;
            summary.count(event.status());
            self.record(event, &mut summary).await;
        }

        tracing::info!(
            loaded = summary.loaded,
            enabled = summary.enabled,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            audit_write_failures = summary.audit_write_failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run complete"
        );

        Ok(summary)
    }

    /// Fetch, evaluate and dispatch one alert. Every path ends in an event.
    async fn process_alert(&self, alert: &AlertDefinition) -> AuditEvent {
        let station_id = alert.station_id.as_str();
        let alert_id = alert.alert_id();

        let measurement = match self.source.fetch(station_id).await {
            Ok(Some(measurement)) => measurement,
            Ok(None) => {
                tracing::warn!(
                    station_id = %station_id,
                    alert_id = %alert_id,
                    "No usable measurement"
                );
                return AuditEvent::skipped(alert, &Measurement::placeholder(), false);
            }
            Err(e) => {
                tracing::error!(
                    station_id = %station_id,
                    alert_id = %alert_id,
                    error = %e,
                    "Measurement fetch failed"
                );
                return AuditEvent::failed(alert, &Measurement::placeholder(), false, e);
            }
        };

        if !evaluate(alert, &measurement) {
            tracing::debug!(
                station_id = %station_id,
                alert_id = %alert_id,
                level = measurement.level,
                min_level = alert.min_level,
                max_level = alert.max_level,
                "Level outside alert range"
            );
            return AuditEvent::skipped(alert, &measurement, false);
        }

        let message = OutboundMessage {
            destination: alert.channel_target.clone(),
            text: format_alert_message(alert, &measurement, self.display_offset),
        };

        match self.channel.send(&message).await {
            Ok(message_id) => {
                tracing::info!(
                    station_id = %station_id,
                    alert_id = %alert_id,
                    level = measurement.level,
                    channel = self.channel.name(),
                    message_id = %message_id,
                    "Alert notification sent"
                );
                AuditEvent::sent(alert, &measurement, message_id)
            }
            Err(e) => {
                tracing::error!(
                    station_id = %station_id,
                    alert_id = %alert_id,
                    level = measurement.level,
                    channel = self.channel.name(),
                    error = %e,
                    "Alert notification failed"
                );
                AuditEvent::failed(alert, &measurement, true, e)
            }
        }
    }

    /// Persist an event. A failed write is logged and counted, never raised.
    async fn record(&self, event: AuditEvent, summary: &mut RunSummary) {
        let station_id = event.station_id.clone();
        let alert_id = event.alert_id.clone();
        let status = event.status();

        match self.recorder.persist(event).await {
            Ok(record) => {
                tracing::debug!(
                    pk = %record.pk,
                    sk = %record.sk,
                    status = %status,
                    "Audit event recorded"
                );
            }
            Err(e) => {
                summary.audit_write_failures += 1;
                tracing::error!(
                    station_id = %station_id,
                    alert_id = %alert_id,
                    status = %status,
                    error = %e,
                    "Failed to write audit event"
                );
            }
        }
    }
}

/// Run-fatal errors
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to load alert definitions: {0}")]
    Load(#[source] StoreError),
}
