//! Notification text formatting

use chrono::FixedOffset;

use crate::alerts::AlertDefinition;
use crate::measurement::Measurement;

/// Rendered in place of a measurement time that could not be parsed
pub const UNKNOWN_TIME: &str = "unknown time";

/// Build the alert message body. Never fails; a bad timestamp renders as
/// [`UNKNOWN_TIME`].
pub fn format_alert_message(
    alert: &AlertDefinition,
    measurement: &Measurement,
    display_offset: FixedOffset,
) -> String {
    format!(
        "⚠️ Water level alert: {}\n\
         Level: {} cm\n\
         Alert range: {} to {} cm\n\
         Measured at: {}",
        alert.display_label(),
        rounded_level(measurement.level),
        alert.min_level,
        alert.max_level,
        render_time(measurement, display_offset),
    )
}

/// Nearest whole unit, halves rounded up (`-2.5` becomes `-2`)
pub fn rounded_level(level: f64) -> i64 {
    (level + 0.5).floor() as i64
}

/// Local wall-clock rendering of the measurement time, `dd.mm.yyyy HH:MM`
pub fn render_time(measurement: &Measurement, display_offset: FixedOffset) -> String {
    measurement
        .measured_at
        .map(|at| {
            at.with_timezone(&display_offset)
                .format("%d.%m.%Y %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cet() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn test_format_message() {
        let alert = AlertDefinition::new("150160180", 235.0, 260.5, "1").with_display_name("Wisła, Kraków");
        let measurement = Measurement::new(245.5, "2026-02-06T10:00:00Z");

        let text = format_alert_message(&alert, &measurement, cet());

        assert!(text.contains("Wisła, Kraków"));
        assert!(text.contains("Level: 246 cm"));
        assert!(text.contains("235 to 260.5 cm"));
        assert!(text.contains("06.02.2026 11:00"));
    }

    #[test]
    fn test_format_falls_back_to_station() {
        let alert = AlertDefinition::new("150160180", 0.0, 10.0, "1");
        let measurement = Measurement::new(4.4, "2026-02-06T10:00:00Z");

        let text = format_alert_message(&alert, &measurement, cet());
        assert!(text.contains("Station 150160180"));
        assert!(text.contains("Level: 4 cm"));
    }

    #[test]
    fn test_rounded_level_rounds_halves_up() {
        assert_eq!(rounded_level(245.5), 246);
        assert_eq!(rounded_level(245.49), 245);
        assert_eq!(rounded_level(-2.5), -2);
        assert_eq!(rounded_level(-2.51), -3);
        assert_eq!(rounded_level(0.0), 0);
    }

    #[test]
    fn test_unparsable_time_uses_placeholder() {
        let alert = AlertDefinition::new("150160180", 0.0, 10.0, "1");
        let measurement = Measurement::new(5.0, "not-a-date");

        assert_eq!(render_time(&measurement, cet()), UNKNOWN_TIME);
        assert!(format_alert_message(&alert, &measurement, cet()).ends_with(UNKNOWN_TIME));
    }
}
