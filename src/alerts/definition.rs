//! Alert definition types

use serde::{Deserialize, Deserializer, Serialize};

/// Alert id used when the stored composite key does not carry one
pub const DEFAULT_ALERT_ID: &str = "default";

/// Prefix of the composite key that identifies an alert definition
pub const ALERT_KEY_PREFIX: &str = "ALERT#";

/// A monitored condition: one station, an inclusive level range and a
/// notification destination.
///
/// `min_level <= max_level` is not enforced. An inverted range simply never
/// matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
    /// External measurement source identifier
    pub station_id: String,
    /// Composite store key (`ALERT#<stationId>#<alertId>`), when present
    #[serde(default, rename = "sk", skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Inclusive lower bound
    pub min_level: f64,
    /// Inclusive upper bound
    pub max_level: f64,
    /// Whether alert is enabled
    pub enabled: bool,
    /// Opaque notification destination (chat id)
    #[serde(deserialize_with = "string_or_number")]
    pub channel_target: String,
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl AlertDefinition {
    /// Create a new enabled alert with the default alert id
    pub fn new(
        station_id: impl Into<String>,
        min_level: f64,
        max_level: f64,
        channel_target: impl Into<String>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            key: None,
            min_level,
            max_level,
            enabled: true,
            channel_target: channel_target.into(),
            display_name: None,
        }
    }

    /// Set the alert id, rebuilding the composite key
    pub fn with_alert_id(mut self, alert_id: impl AsRef<str>) -> Self {
        self.key = Some(format!(
            "{}{}#{}",
            ALERT_KEY_PREFIX,
            self.station_id,
            alert_id.as_ref()
        ));
        self
    }

    /// Set display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Alert id extracted from the composite key, falling back to `"default"`
    pub fn alert_id(&self) -> &str {
        self.key
            .as_deref()
            .and_then(alert_id_from_key)
            .unwrap_or(DEFAULT_ALERT_ID)
    }

    /// Name shown in notifications
    pub fn display_label(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Station {}", self.station_id),
        }
    }
}

/// Extract the alert id segment from `ALERT#<stationId>#<alertId>`.
///
/// Keys without the prefix are accepted as `<stationId>#<alertId>`.
fn alert_id_from_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(ALERT_KEY_PREFIX).unwrap_or(key);
    let (_, alert_id) = rest.split_once('#')?;
    if alert_id.is_empty() {
        None
    } else {
        Some(alert_id)
    }
}

/// Chat ids arrive as either JSON strings or integers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
