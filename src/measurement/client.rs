//! HTTP client for the station measurement source

use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;

use super::parse::{parse_measurement, Measurement};

/// Public hydrological endpoint; the station id is appended verbatim
pub const DEFAULT_BASE_URL: &str = "https://danepubliczne.imgw.pl/api/data/hydro/id/";

/// Default per-fetch timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce the latest measurement for a station
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Latest reading, or `None` when the source has nothing usable
    async fn fetch(&self, station_id: &str) -> Result<Option<Measurement>, MeasurementError>;
}

/// Measurement client configuration
#[derive(Debug, Clone)]
pub struct MeasurementConfig {
    /// Base URL the station id is appended to
    pub base_url: String,
    /// Bound on the whole request, body included
    pub timeout: Duration,
    /// Offset used to read naive source timestamps
    pub source_offset: FixedOffset,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            source_offset: Utc.fix(),
        }
    }
}

impl MeasurementConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source_offset(mut self, offset: FixedOffset) -> Self {
        self.source_offset = offset;
        self
    }
}

/// Fetches the most recent reading of a station
#[derive(Debug, Clone)]
pub struct MeasurementClient {
    http_client: reqwest::Client,
    config: MeasurementConfig,
}

impl MeasurementClient {
    pub fn new(config: MeasurementConfig) -> Result<Self, MeasurementError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| MeasurementError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Fetch and parse the latest record of a station.
    ///
    /// Only the first array element is considered; the source lists the
    /// newest record first.
    pub async fn fetch_station(&self, station_id: &str) -> Result<Option<Measurement>, MeasurementError> {
        let url = format!("{}{}", self.config.base_url, station_id);

        let body = tokio::time::timeout(self.config.timeout, self.get_json(&url))
            .await
            .map_err(|_| MeasurementError::Timeout {
                ms: self.timeout_ms(),
            })??;

        let records = body.as_array().ok_or_else(|| {
            MeasurementError::Format(format!("expected a JSON array, got {}", json_kind(&body)))
        })?;

        let Some(first) = records.first() else {
            tracing::debug!(station_id = %station_id, "Measurement source returned no records");
            return Ok(None);
        };

        let measurement = parse_measurement(first, self.config.source_offset);
        if measurement.is_none() {
            tracing::debug!(
                station_id = %station_id,
                record = %first,
                "Latest record has no usable level"
            );
        }

        Ok(measurement)
    }

    async fn get_json(&self, url: &str) -> Result<Value, MeasurementError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MeasurementError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MeasurementError::Format(format!("invalid JSON body: {}", e)))
    }

    fn transport_error(&self, e: reqwest::Error) -> MeasurementError {
        if e.is_timeout() {
            MeasurementError::Timeout {
                ms: self.timeout_ms(),
            }
        } else {
            MeasurementError::Transport(e.to_string())
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }
}

#[async_trait]
impl MeasurementSource for MeasurementClient {
    async fn fetch(&self, station_id: &str) -> Result<Option<Measurement>, MeasurementError> {
        self.fetch_station(station_id).await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Measurement source errors
#[derive(Debug, thiserror::Error)]
pub enum MeasurementError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Measurement source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response format: {0}")]
    Format(String),
}

impl MeasurementError {
    /// Network failures, timeouts and non-success statuses
    pub fn is_transport(&self) -> bool {
        !matches!(self, MeasurementError::Format(_))
    }
}
