//! Runtime configuration
//!
//! Every setting comes from an environment variable and has a default.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::measurement::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::notify::dispatcher::{DEFAULT_API_URL, DEFAULT_SEND_TIMEOUT};
use crate::store::file::DEFAULT_ALERTS_PARTITION;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Alert definitions file
    pub alerts_file: PathBuf,
    /// Partition the alert query reads
    pub alerts_partition: String,
    /// Audit trail file (JSON Lines)
    pub audit_file: PathBuf,
    /// Name of the environment variable holding the channel credential
    pub credential_ref: Option<String>,
    /// Measurement source base URL
    pub source_url: String,
    /// Per-fetch timeout
    pub fetch_timeout: Duration,
    /// Channel API base URL
    pub channel_api_url: String,
    /// Per-send timeout for the channel API
    pub send_timeout: Duration,
    /// Audit retention in days, if records should expire
    pub audit_retention_days: Option<u32>,
    /// Offset (minutes east of UTC) for naive source times and message rendering
    pub display_offset_minutes: i32,
    /// Built-in schedule; `None` runs once and exits
    pub interval: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alerts_file: PathBuf::from("alerts.json"),
            alerts_partition: DEFAULT_ALERTS_PARTITION.to_string(),
            audit_file: PathBuf::from("audit.jsonl"),
            credential_ref: None,
            source_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout: DEFAULT_TIMEOUT,
            channel_api_url: DEFAULT_API_URL.to_string(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            audit_retention_days: None,
            display_offset_minutes: 60,
            interval: None,
        }
    }
}

impl AppConfig {
    /// Create a config from environment variables
    /// HYDROALERT_ALERTS_FILE=alerts.json
    /// HYDROALERT_ALERTS_PARTITION=CONFIG#ALERTS
    /// HYDROALERT_AUDIT_FILE=audit.jsonl
    /// HYDROALERT_CREDENTIAL_REF=TELEGRAM_BOT_TOKEN
    /// HYDROALERT_SOURCE_URL=https://danepubliczne.imgw.pl/api/data/hydro/id/
    /// HYDROALERT_FETCH_TIMEOUT_MS=10000
    /// HYDROALERT_CHANNEL_API_URL=https://api.telegram.org
    /// HYDROALERT_SEND_TIMEOUT_MS=10000
    /// HYDROALERT_AUDIT_RETENTION_DAYS=90
    /// HYDROALERT_DISPLAY_UTC_OFFSET_MINUTES=60
    /// HYDROALERT_INTERVAL_SECS=600
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            alerts_file: text("HYDROALERT_ALERTS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.alerts_file),
            alerts_partition: text("HYDROALERT_ALERTS_PARTITION").unwrap_or(defaults.alerts_partition),
            audit_file: text("HYDROALERT_AUDIT_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_file),
            credential_ref: text("HYDROALERT_CREDENTIAL_REF"),
            source_url: text("HYDROALERT_SOURCE_URL").unwrap_or(defaults.source_url),
            fetch_timeout: parse_var(&text, "HYDROALERT_FETCH_TIMEOUT_MS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.fetch_timeout),
            channel_api_url: text("HYDROALERT_CHANNEL_API_URL").unwrap_or(defaults.channel_api_url),
            send_timeout: parse_var(&text, "HYDROALERT_SEND_TIMEOUT_MS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.send_timeout),
            audit_retention_days: parse_var(&text, "HYDROALERT_AUDIT_RETENTION_DAYS")
                .filter(|days: &u32| *days > 0),
            display_offset_minutes: parse_var(&text, "HYDROALERT_DISPLAY_UTC_OFFSET_MINUTES")
                .filter(|minutes: &i32| minutes.abs() < 24 * 60)
                .unwrap_or(defaults.display_offset_minutes),
            interval: parse_var(&text, "HYDROALERT_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Offset for naive source timestamps and message rendering
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Audit retention window
    pub fn audit_retention(&self) -> Option<chrono::Duration> {
        self.audit_retention_days
            .map(|days| chrono::Duration::days(i64::from(days)))
    }
}

/// Parse a variable, warning and returning `None` when it is malformed
fn parse_var<T, F>(text: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = text(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = %name, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.send_timeout, Duration::from_secs(10));
        assert_eq!(config.credential_ref, None);
        assert_eq!(config.interval, None);
        assert_eq!(config.display_offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HYDROALERT_ALERTS_FILE", "/etc/hydroalert/alerts.json"),
            ("HYDROALERT_CREDENTIAL_REF", "TELEGRAM_BOT_TOKEN"),
            ("HYDROALERT_FETCH_TIMEOUT_MS", "2500"),
            ("HYDROALERT_SEND_TIMEOUT_MS", "4000"),
            ("HYDROALERT_AUDIT_RETENTION_DAYS", "90"),
            ("HYDROALERT_DISPLAY_UTC_OFFSET_MINUTES", "120"),
            ("HYDROALERT_INTERVAL_SECS", "600"),
        ]);

        assert_eq!(config.alerts_file, PathBuf::from("/etc/hydroalert/alerts.json"));
        assert_eq!(config.credential_ref.as_deref(), Some("TELEGRAM_BOT_TOKEN"));
        assert_eq!(config.fetch_timeout, Duration::from_millis(2500));
        assert_eq!(config.send_timeout, Duration::from_millis(4000));
        assert_eq!(config.audit_retention(), Some(chrono::Duration::days(90)));
        assert_eq!(config.display_offset().local_minus_utc(), 7200);
        assert_eq!(config.interval, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = config_from(&[
            ("HYDROALERT_FETCH_TIMEOUT_MS", "soon"),
            ("HYDROALERT_AUDIT_RETENTION_DAYS", "-1"),
            ("HYDROALERT_DISPLAY_UTC_OFFSET_MINUTES", "100000"),
            ("HYDROALERT_INTERVAL_SECS", "0"),
            ("HYDROALERT_CREDENTIAL_REF", "   "),
        ]);

        assert_eq!(config.fetch_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.audit_retention_days, None);
        assert_eq!(config.display_offset_minutes, 60);
        assert_eq!(config.interval, None);
        assert_eq!(config.credential_ref, None);
    }
}
