//! Audit events describing one alert-processing attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::AlertDefinition;
use crate::measurement::Measurement;

/// Outcome of an attempt. Each variant carries only its own fields, so a
/// `Sent` event always has `sent_at` and never an error, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    #[serde(rename_all = "camelCase")]
    Sent {
        sent_at: DateTime<Utc>,
        message_id: String,
    },
    Failed {
        error: String,
    },
    Skipped,
}

/// Flat status tag, for logging and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditStatus {
    Sent,
    Failed,
    Skipped,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Sent => write!(f, "SENT"),
            AuditStatus::Failed => write!(f, "FAILED"),
            AuditStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Immutable record of one processing attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub station_id: String,
    pub alert_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub level: f64,
    /// Measurement time as the source reported it
    pub measurement_time_raw: String,
    /// Measurement time normalized to UTC, when parsable
    pub measurement_time: Option<DateTime<Utc>>,
    /// Whether the measurement fell inside the alert range
    pub matched: bool,
    pub attempted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AuditEvent {
    fn base(alert: &AlertDefinition, measurement: &Measurement, matched: bool, outcome: Outcome) -> Self {
        Self {
            station_id: alert.station_id.clone(),
            alert_id: alert.alert_id().to_string(),
            display_name: alert.display_name.clone(),
            level: measurement.level,
            measurement_time_raw: measurement.measurement_time.clone(),
            measurement_time: measurement.measured_at,
            matched,
            attempted_at: Utc::now(),
            outcome,
        }
    }

    /// Notification delivered
    pub fn sent(alert: &AlertDefinition, measurement: &Measurement, message_id: impl Into<String>) -> Self {
        Self::base(
            alert,
            measurement,
            true,
            Outcome::Sent {
                sent_at: Utc::now(),
                message_id: message_id.into(),
            },
        )
    }

    /// Processing failed; `matched` tells whether the failure happened after a match
    pub fn failed(
        alert: &AlertDefinition,
        measurement: &Measurement,
        matched: bool,
        error: impl std::fmt::Display,
    ) -> Self {
        Self::base(
            alert,
            measurement,
            matched,
            Outcome::Failed {
                error: error.to_string(),
            },
        )
    }

    /// Nothing to send: no measurement, or the level was out of range
    pub fn skipped(alert: &AlertDefinition, measurement: &Measurement, matched: bool) -> Self {
        Self::base(alert, measurement, matched, Outcome::Skipped)
    }

    pub fn status(&self) -> AuditStatus {
        match self.outcome {
            Outcome::Sent { .. } => AuditStatus::Sent,
            Outcome::Failed { .. } => AuditStatus::Failed,
            Outcome::Skipped => AuditStatus::Skipped,
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        match &self.outcome {
            Outcome::Sent { sent_at, .. } => Some(*sent_at),
            _ => None,
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Sent { message_id, .. } => Some(message_id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}
