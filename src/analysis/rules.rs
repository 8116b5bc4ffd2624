//! Hazard rules for weather measurements
//!
//! The engine checks five independent rule groups in a fixed order:
//!
//! 1. temperature tier (extreme-high, high, extreme-low, low; first match only)
//! 2. rapid temperature change (only when the trend has enough history)
//! 3. wind tier (extreme supersedes high)
//! 4. rainfall tier (extreme supersedes heavy)
//! 5. tropical storm composite (high wind and heavy rain together)
//!
//! Each group contributes at most one alert, so a single measurement yields
//! between zero and five alerts, returned in the order above.

use serde::{Deserialize, Serialize};

use crate::models::{Alert, AlertType, Measurement, Severity};

/// Numeric thresholds used by the [`RuleEngine`]
///
/// All comparisons are strict: a reading exactly at a threshold does not fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// °C, above which heat is extreme
    pub extreme_high_temperature: f64,
    /// °C, above which heat is high
    pub high_temperature: f64,
    /// °C, below which cold is extreme
    pub extreme_low_temperature: f64,
    /// °C, below which it is freezing
    pub low_temperature: f64,
    /// °C of absolute change within the trend window
    pub rapid_temperature_change: f64,
    /// m/s
    pub extreme_wind: f64,
    /// m/s, also the wind half of the storm composite
    pub high_wind: f64,
    /// mm/h
    pub extreme_rainfall: f64,
    /// mm/h, also the rain half of the storm composite
    pub heavy_rainfall: f64,
    /// Lookback quoted in the rapid-change message
    pub trend_window_minutes: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            extreme_high_temperature: 38.0,
            high_temperature: 32.0,
            extreme_low_temperature: -10.0,
            low_temperature: 0.0,
            rapid_temperature_change: 5.0,
            extreme_wind: 25.0,
            high_wind: 15.0,
            extreme_rainfall: 15.0,
            heavy_rainfall: 5.0,
            trend_window_minutes: 30,
        }
    }
}

/// Stateless evaluator turning a measurement plus trend context into alerts
///
/// Holds only immutable thresholds and can be shared freely across tasks.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    thresholds: Thresholds,
}

impl RuleEngine {
    /// Create an engine with the standard thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Evaluate every rule group against the measurement
    pub fn evaluate(&self, measurement: &Measurement, trend_delta: f64, has_trend_data: bool) -> Vec<Alert> {
        [
            self.temperature_alert(measurement),
            self.rapid_change_alert(measurement, trend_delta, has_trend_data),
            self.wind_alert(measurement),
            self.rainfall_alert(measurement),
            self.storm_alert(measurement),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn temperature_alert(&self, m: &Measurement) -> Option<Alert> {
        let t = &self.thresholds;
        let temp = m.temperature;
        let place = &m.location_name;

        let (alert_type, severity, message) = if temp > t.extreme_high_temperature {
            (
                AlertType::ExtremeHighTemperature,
                Severity::High,
                format!("Extreme heat alert: {temp:.1}°C at {place}"),
            )
        } else if temp > t.high_temperature {
            (
                AlertType::HighTemperature,
                Severity::Medium,
                format!("High temperature alert: {temp:.1}°C at {place}"),
            )
        } else if temp < t.extreme_low_temperature {
            (
                AlertType::ExtremeLowTemperature,
                Severity::High,
                format!("Extreme cold alert: {temp:.1}°C at {place}"),
            )
        } else if temp < t.low_temperature {
            (
                AlertType::LowTemperature,
                Severity::Medium,
                format!("Low temperature alert: {temp:.1}°C at {place}"),
            )
        } else {
            return None;
        };

        Some(Alert::new(m, alert_type, message, temp, severity))
    }

    fn rapid_change_alert(&self, m: &Measurement, delta: f64, has_trend_data: bool) -> Option<Alert> {
        if !has_trend_data || delta.abs() <= self.thresholds.rapid_temperature_change {
            return None;
        }

        let message = format!(
            "Rapid temperature change of {delta:.1}°C in the last {} minutes at {}",
            self.thresholds.trend_window_minutes, m.location_name
        );
        Some(Alert::new(
            m,
            AlertType::RapidTemperatureChange,
            message,
            delta.abs(),
            Severity::Medium,
        ))
    }

    fn wind_alert(&self, m: &Measurement) -> Option<Alert> {
        let speed = m.wind_speed;
        let place = &m.location_name;

        if speed > self.thresholds.extreme_wind {
            Some(Alert::new(
                m,
                AlertType::ExtremeWind,
                format!("Dangerous wind speeds of {speed:.1} m/s detected at {place}"),
                speed,
                Severity::High,
            ))
        } else if speed > self.thresholds.high_wind {
            Some(Alert::new(
                m,
                AlertType::HighWind,
                format!("High wind speed of {speed:.1} m/s detected at {place}"),
                speed,
                Severity::Medium,
            ))
        } else {
            None
        }
    }

    fn rainfall_alert(&self, m: &Measurement) -> Option<Alert> {
        let rain = m.precipitation;
        let place = &m.location_name;

        if rain > self.thresholds.extreme_rainfall {
            Some(Alert::new(
                m,
                AlertType::ExtremeRainfall,
                format!("Extreme rainfall of {rain:.1} mm/h detected at {place}"),
                rain,
                Severity::High,
            ))
        } else if rain > self.thresholds.heavy_rainfall {
            Some(Alert::new(
                m,
                AlertType::HeavyRainfall,
                format!("Heavy rainfall of {rain:.1} mm/h detected at {place}"),
                rain,
                Severity::Medium,
            ))
        } else {
            None
        }
    }

    fn storm_alert(&self, m: &Measurement) -> Option<Alert> {
        if m.wind_speed <= self.thresholds.high_wind || m.precipitation <= self.thresholds.heavy_rainfall {
            return None;
        }

        let message = format!(
            "Potential storm conditions detected at {}: Wind {:.1} m/s, Rain {:.1} mm/h",
            m.location_name, m.wind_speed, m.precipitation
        );
        // Wind speed is the primary value for the composite
        Some(Alert::new(
            m,
            AlertType::TropicalStormConditions,
            message,
            m.wind_speed,
            Severity::High,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WindDirection;
    use chrono::Utc;

    fn calm(temperature: f64) -> Measurement {
        Measurement {
            location_id: "loc-1".to_string(),
            location_name: "Cairo, EG".to_string(),
            temperature,
            humidity: 40.0,
            wind_speed: 2.0,
            wind_direction: WindDirection::N,
            precipitation: 0.0,
            timestamp: Utc::now(),
        }
    }

    fn kinds(alerts: &[Alert]) -> Vec<(AlertType, Severity)> {
        alerts.iter().map(|a| (a.alert_type, a.severity)).collect()
    }

    #[test]
    fn test_neutral_measurement_has_no_alerts() {
        let engine = RuleEngine::new();
        assert!(engine.evaluate(&calm(20.0), 0.0, false).is_empty());
    }

    #[test]
    fn test_temperature_tiers() {
        let engine = RuleEngine::new();
        let cases = [
            (40.0, Some((AlertType::ExtremeHighTemperature, Severity::High))),
            (35.0, Some((AlertType::HighTemperature, Severity::Medium))),
            (-15.0, Some((AlertType::ExtremeLowTemperature, Severity::High))),
            (-2.0, Some((AlertType::LowTemperature, Severity::Medium))),
            (38.0, Some((AlertType::HighTemperature, Severity::Medium))),
            (32.0, None),
            (0.0, None),
            (-10.0, Some((AlertType::LowTemperature, Severity::Medium))),
        ];

        for (temp, expected) in cases {
            let alerts = engine.evaluate(&calm(temp), 0.0, false);
            assert_eq!(kinds(&alerts).first().copied(), expected, "temperature {temp}");
            assert!(alerts.len() <= 1);
        }
    }

    #[test]
    fn test_extreme_heat_message_and_value() {
        let engine = RuleEngine::new();
        let alerts = engine.evaluate(&calm(41.25), 0.0, false);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].value, 41.25);
        assert!(alerts[0].message.contains("Cairo, EG"));
        assert!(alerts[0].message.contains("41.2°C") || alerts[0].message.contains("41.3°C"));
    }

    #[test]
    fn test_rapid_change_requires_trend_data() {
        let engine = RuleEngine::new();
        assert!(engine.evaluate(&calm(20.0), -10.0, false).is_empty());

        let alerts = engine.evaluate(&calm(20.0), -10.0, true);
        assert_eq!(kinds(&alerts), vec![(AlertType::RapidTemperatureChange, Severity::Medium)]);
        assert_eq!(alerts[0].value, 10.0);
        assert!(alerts[0].message.contains("-10.0°C"));
        assert!(alerts[0].message.contains("30 minutes"));
    }

    #[test]
    fn test_rapid_change_boundary_is_strict() {
        let engine = RuleEngine::new();
        assert!(engine.evaluate(&calm(20.0), 5.0, true).is_empty());
        assert!(engine.evaluate(&calm(20.0), -5.0, true).is_empty());
        assert_eq!(engine.evaluate(&calm(20.0), 5.01, true).len(), 1);
    }

    #[test]
    fn test_rapid_change_co_fires_with_temperature_tier() {
        let engine = RuleEngine::new();
        let alerts = engine.evaluate(&calm(39.0), 8.0, true);
        assert_eq!(
            kinds(&alerts),
            vec![
                (AlertType::ExtremeHighTemperature, Severity::High),
                (AlertType::RapidTemperatureChange, Severity::Medium),
            ]
        );
    }

    #[test]
    fn test_wind_and_rain_tiers() {
        let engine = RuleEngine::new();

        let mut m = calm(20.0);
        m.wind_speed = 30.0;
        assert_eq!(kinds(&engine.evaluate(&m, 0.0, false)), vec![(AlertType::ExtremeWind, Severity::High)]);

        let mut m = calm(20.0);
        m.precipitation = 20.0;
        assert_eq!(
            kinds(&engine.evaluate(&m, 0.0, false)),
            vec![(AlertType::ExtremeRainfall, Severity::High)]
        );

        let mut m = calm(20.0);
        m.precipitation = 5.0;
        m.wind_speed = 15.0;
        assert!(engine.evaluate(&m, 0.0, false).is_empty());
    }

    #[test]
    fn test_storm_composite() {
        let engine = RuleEngine::new();
        let mut m = calm(20.0);
        m.wind_speed = 20.0;
        m.precipitation = 6.0;

        let alerts = engine.evaluate(&m, 0.0, false);
        assert_eq!(
            kinds(&alerts),
            vec![
                (AlertType::HighWind, Severity::Medium),
                (AlertType::HeavyRainfall, Severity::Medium),
                (AlertType::TropicalStormConditions, Severity::High),
            ]
        );
        let storm = &alerts[2];
        assert_eq!(storm.value, 20.0);
        assert!(storm.message.contains("Wind 20.0 m/s, Rain 6.0 mm/h"));
    }

    #[test]
    fn test_maximum_of_five_alerts() {
        let engine = RuleEngine::new();
        let mut m = calm(45.0);
        m.wind_speed = 30.0;
        m.precipitation = 25.0;

        let alerts = engine.evaluate(&m, 12.0, true);
        assert_eq!(
            kinds(&alerts),
            vec![
                (AlertType::ExtremeHighTemperature, Severity::High),
                (AlertType::RapidTemperatureChange, Severity::Medium),
                (AlertType::ExtremeWind, Severity::High),
                (AlertType::ExtremeRainfall, Severity::High),
                (AlertType::TropicalStormConditions, Severity::High),
            ]
        );
        assert!(alerts.iter().all(|a| a.location_id == "loc-1"));
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = RuleEngine::with_thresholds(Thresholds {
            high_wind: 10.0,
            ..Thresholds::default()
        });
        let mut m = calm(20.0);
        m.wind_speed = 12.0;
        assert_eq!(kinds(&engine.evaluate(&m, 0.0, false)), vec![(AlertType::HighWind, Severity::Medium)]);
    }
}
