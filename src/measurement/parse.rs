//! Parsing of raw station records into measurements

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Field holding the water level
pub const LEVEL_FIELD: &str = "stan_wody";

/// Fields consulted for the measurement time, highest priority first.
///
/// The first field holding a non-blank string wins. When none does, the
/// measurement is stamped with the current instant.
pub const TIMESTAMP_FIELDS: &[&str] = &["stan_wody_data_pomiaru", "data_pomiaru", "czas_pomiaru"];

/// Level recorded for attempts that never produced a real measurement
pub const PLACEHOLDER_LEVEL: f64 = -9999.0;

/// Naive layouts the source is known to use, tried after RFC 3339
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single station reading
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Water level
    pub level: f64,
    /// Timestamp exactly as the source provided it
    pub measurement_time: String,
    /// Normalized timestamp, `None` when the source string is unparsable
    pub measured_at: Option<DateTime<Utc>>,
    /// Decoded source record, kept for debugging
    pub raw: Option<Value>,
}

impl Measurement {
    /// Create a measurement, interpreting naive timestamps as UTC
    pub fn new(level: f64, measurement_time: impl Into<String>) -> Self {
        let measurement_time = measurement_time.into();
        let measured_at = normalize_timestamp(&measurement_time, Utc.fix());
        Self {
            level,
            measurement_time,
            measured_at,
            raw: None,
        }
    }

    /// Stand-in used when no measurement could be obtained
    pub fn placeholder() -> Self {
        let now = Utc::now();
        Self {
            level: PLACEHOLDER_LEVEL,
            measurement_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            measured_at: Some(now),
            raw: None,
        }
    }

    /// Attach the decoded source record
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Coerce a JSON value into a finite number.
///
/// Numbers are taken as-is, strings are trimmed and parsed, booleans map to
/// 1 and 0. Everything else, and any non-finite result, yields `None`.
pub fn convert_to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    number.is_finite().then_some(number)
}

/// Build a measurement from one source record.
///
/// Returns `None` when the level field is missing or not a finite number.
/// Naive timestamps are read in `source_offset`.
pub fn parse_measurement(record: &Value, source_offset: FixedOffset) -> Option<Measurement> {
    let level = record.get(LEVEL_FIELD).and_then(convert_to_number)?;

    let (measurement_time, measured_at) = match extract_timestamp(record) {
        Some(raw) => {
            let normalized = normalize_timestamp(&raw, source_offset);
            (raw, normalized)
        }
        None => {
            let now = Utc::now();
            (now.to_rfc3339_opts(SecondsFormat::Secs, true), Some(now))
        }
    };

    Some(Measurement {
        level,
        measurement_time,
        measured_at,
        raw: Some(record.clone()),
    })
}

/// First non-blank timestamp among [`TIMESTAMP_FIELDS`]
pub fn extract_timestamp(record: &Value) -> Option<String> {
    TIMESTAMP_FIELDS.iter().find_map(|field| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

/// Parse a source timestamp into UTC.
///
/// RFC 3339 strings carry their own offset; naive strings are read in
/// `source_offset`.
pub fn normalize_timestamp(raw: &str, source_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_LAYOUTS.iter().find_map(|layout| {
        let naive = NaiveDateTime::parse_from_str(raw, layout).ok()?;
        source_offset
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.with_timezone(&Utc))
    })
}
