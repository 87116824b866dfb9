//! Threshold evaluation

use super::definition::AlertDefinition;
use crate::measurement::Measurement;

/// Decide whether a measurement matches an alert.
///
/// Disabled alerts never match. Otherwise the level must lie within
/// `[min_level, max_level]`, both bounds inclusive and compared exactly.
pub fn evaluate(alert: &AlertDefinition, measurement: &Measurement) -> bool {
    if !alert.enabled {
        return false;
    }

    level_in_range(measurement.level, alert.min_level, alert.max_level)
}

fn level_in_range(level: f64, min_level: f64, max_level: f64) -> bool {
    min_level <= level && level <= max_level
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(level: f64) -> Measurement {
        Measurement::new(level, "2026-02-06T10:00:00Z")
    }

    #[test]
    fn test_evaluate_inside_range() {
        let alert = AlertDefinition::new("150160180", 235.0, 260.0, "1");

        assert!(evaluate(&alert, &reading(245.5)));
        assert!(!evaluate(&alert, &reading(300.0)));
        assert!(!evaluate(&alert, &reading(234.99)));
    }

    #[test]
    fn test_evaluate_inclusive_bounds() {
        let alert = AlertDefinition::new("150160180", 235.0, 260.0, "1");

        assert!(evaluate(&alert, &reading(235.0)));
        assert!(evaluate(&alert, &reading(260.0)));
        assert!(!evaluate(&alert, &reading(260.000_001)));
    }

    #[test]
    fn test_evaluate_disabled_never_matches() {
        let alert = AlertDefinition::new("150160180", 235.0, 260.0, "1").with_enabled(false);

        for level in [235.0, 245.5, 260.0, 0.0, -10.0, 1e9] {
            assert!(!evaluate(&alert, &reading(level)));
        }
    }

    #[test]
    fn test_evaluate_single_point_range() {
        let alert = AlertDefinition::new("150160180", 120.5, 120.5, "1");

        assert!(evaluate(&alert, &reading(120.5)));
        assert!(!evaluate(&alert, &reading(120.4)));
        assert!(!evaluate(&alert, &reading(120.6)));
    }

    #[test]
    fn test_evaluate_negative_and_inverted_ranges() {
        let alert = AlertDefinition::new("150160180", -20.0, 0.0, "1");
        assert!(evaluate(&alert, &reading(-5.0)));
        assert!(evaluate(&alert, &reading(0.0)));

        let inverted = AlertDefinition::new("150160180", 300.0, 200.0, "1");
        for level in [150.0, 200.0, 250.0, 300.0, 350.0] {
            assert!(!evaluate(&inverted, &reading(level)));
        }
    }
}
