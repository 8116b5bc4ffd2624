//! Core data structures for stormwatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Validation failures at the ingestion and alert-construction boundaries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Payload could not be decoded into a measurement
    #[error("malformed measurement: {0}")]
    Malformed(String),

    /// Measurement arrived without a location identifier
    #[error("measurement is missing a location id")]
    MissingLocationId,

    /// A numeric field was NaN or infinite
    #[error("field '{field}' must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Severity outside the HIGH/MEDIUM/LOW enumeration
    #[error("unknown severity '{0}'")]
    UnknownSeverity(String),

    /// Alert type outside the closed enumeration
    #[error("unknown alert type '{0}'")]
    UnknownAlertType(String),

    /// Wind direction that is not one of the 8 compass labels
    #[error("unknown wind direction '{0}'")]
    UnknownWindDirection(String),
}

// ============================================================================
// Wind Direction
// ============================================================================

/// Eight-point compass direction the wind blows from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl WindDirection {
    const ALL: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Convert a meteorological bearing in degrees to the nearest compass point
    pub fn from_degrees(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        let index = (normalized / 45.0).round() as usize % 8;
        Self::ALL[index]
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownWindDirection(s.to_string()))
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// One timestamped weather reading for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub location_id: String,
    pub location_name: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// Metres per second
    pub wind_speed: f64,
    pub wind_direction: WindDirection,
    /// Millimetres per hour
    pub precipitation: f64,
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    /// Check the measurement is well-formed before it reaches the analysis core
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.location_id.trim().is_empty() {
            return Err(ValidationError::MissingLocationId);
        }

        let numeric = [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("windSpeed", self.wind_speed),
            ("precipitation", self.precipitation),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field, value });
            }
        }

        Ok(())
    }
}

/// Measurement as submitted by an ingestion collaborator
///
/// Identical to [`Measurement`] except that the timestamp may be omitted, in
/// which case the arrival time is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementInput {
    #[serde(default)]
    pub location_id: String,
    #[serde(default)]
    pub location_name: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: WindDirection,
    pub precipitation: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MeasurementInput {
    /// Stamp with `arrived_at` if needed and validate
    pub fn into_measurement(self, arrived_at: DateTime<Utc>) -> Result<Measurement, ValidationError> {
        let measurement = Measurement {
            location_id: self.location_id,
            location_name: self.location_name,
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            precipitation: self.precipitation,
            timestamp: self.timestamp.unwrap_or(arrived_at),
        };
        measurement.validate()?;
        Ok(measurement)
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Severity tier of an alert, ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// All tiers, highest first
    pub fn all() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(ValidationError::UnknownSeverity(other.to_string())),
        }
    }
}

// ============================================================================
// Alert Type
// ============================================================================

/// Closed set of hazardous conditions the rule engine can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    ExtremeHighTemperature,
    HighTemperature,
    ExtremeLowTemperature,
    LowTemperature,
    RapidTemperatureChange,
    ExtremeWind,
    HighWind,
    ExtremeRainfall,
    HeavyRainfall,
    TropicalStormConditions,
}

impl AlertType {
    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtremeHighTemperature => "EXTREME_HIGH_TEMPERATURE",
            Self::HighTemperature => "HIGH_TEMPERATURE",
            Self::ExtremeLowTemperature => "EXTREME_LOW_TEMPERATURE",
            Self::LowTemperature => "LOW_TEMPERATURE",
            Self::RapidTemperatureChange => "RAPID_TEMPERATURE_CHANGE",
            Self::ExtremeWind => "EXTREME_WIND",
            Self::HighWind => "HIGH_WIND",
            Self::ExtremeRainfall => "EXTREME_RAINFALL",
            Self::HeavyRainfall => "HEAVY_RAINFALL",
            Self::TropicalStormConditions => "TROPICAL_STORM_CONDITIONS",
        }
    }

    /// Get all alert types
    pub fn all() -> Vec<Self> {
        vec![
            Self::ExtremeHighTemperature,
            Self::HighTemperature,
            Self::ExtremeLowTemperature,
            Self::LowTemperature,
            Self::RapidTemperatureChange,
            Self::ExtremeWind,
            Self::HighWind,
            Self::ExtremeRainfall,
            Self::HeavyRainfall,
            Self::TropicalStormConditions,
        ]
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = ValidationError;

    /// Case-sensitive: `high_wind` is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownAlertType(s.to_string()))
    }
}

// ============================================================================
// Alert
// ============================================================================

/// One detected hazardous-condition event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: String,
    pub location_id: String,
    pub location_name: String,
    pub alert_type: AlertType,
    pub message: String,
    /// Reading of the metric that triggered the alert
    pub value: f64,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Create an alert for `measurement` with a fresh id and the current time
    pub fn new(
        measurement: &Measurement,
        alert_type: AlertType,
        message: String,
        value: f64,
        severity: Severity,
    ) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            location_id: measurement.location_id.clone(),
            location_name: measurement.location_name.clone(),
            alert_type,
            message,
            value,
            severity,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} ({})",
            self.severity, self.alert_type, self.message, self.alert_id
        )
    }
}
