//! OpenWeatherMap current-conditions client
//!
//! Fetches `/data/2.5/weather` for a city and converts the response into a
//! validated [`Measurement`].

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::models::{Measurement, ValidationError, WindDirection};

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the weather API client
#[derive(Debug, Clone)]
pub struct WeatherClientConfig {
    /// API base URL, without trailing path
    pub base_url: String,

    /// API key sent as `appid`
    pub api_key: String,

    /// Request timeout
    pub timeout: Duration,

    /// Retry count for transient failures
    pub retry_count: u32,

    /// Delay between retries
    pub retry_delay: Duration,
}

impl WeatherClientConfig {
    /// Create a new client config
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            retry_count: 2,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Build from the `[ingest]` configuration section
    pub fn from_ingest(config: &IngestConfig) -> Result<Self, IngestError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(IngestError::MissingApiKey)?;

        Ok(Self::new(config.api_base_url.clone(), api_key)
            .with_timeout(config.request_timeout()))
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry count
    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Set retry delay
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainData,
    wind: WindData,
    #[serde(default)]
    rain: Option<RainData>,
    name: String,
    sys: SysData,
}

#[derive(Debug, Deserialize)]
struct MainData {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindData {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct RainData {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct SysData {
    #[serde(default)]
    country: String,
}

// ============================================================================
// Weather Client
// ============================================================================

/// Client for an OpenWeatherMap-compatible API
///
/// Location ids are random UUIDs assigned on first sight of a
/// `<name>,<country>` pair and stable for the lifetime of the client.
pub struct OpenWeatherMapClient {
    config: WeatherClientConfig,
    http_client: Client,
    location_ids: RwLock<HashMap<String, String>>,
}

impl OpenWeatherMapClient {
    /// Create a new weather client
    pub fn new(config: WeatherClientConfig) -> Result<Self, IngestError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IngestError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            location_ids: RwLock::new(HashMap::new()),
        })
    }

    /// Fetch current conditions for `city` (e.g. `"Tokyo,jp"`)
    pub async fn fetch_city(&self, city: &str) -> Result<Measurement, IngestError> {
        tracing::info!(city, "Fetching weather data");

        let weather = self.get_with_retry(city).await?;
        self.to_measurement(weather).await
    }

    async fn to_measurement(&self, weather: CurrentWeather) -> Result<Measurement, IngestError> {
        let key = format!("{},{}", weather.name, weather.sys.country);
        let location_id = self.location_id_for(&key).await;

        let measurement = Measurement {
            location_id,
            location_name: format!("{}, {}", weather.name, weather.sys.country),
            temperature: weather.main.temp,
            humidity: weather.main.humidity,
            wind_speed: weather.wind.speed,
            wind_direction: WindDirection::from_degrees(weather.wind.deg),
            precipitation: weather.rain.map_or(0.0, |r| r.one_hour),
            timestamp: Utc::now(),
        };
        measurement.validate()?;

        Ok(measurement)
    }

    async fn location_id_for(&self, key: &str) -> String {
        if let Some(id) = self.location_ids.read().await.get(key) {
            return id.clone();
        }

        self.location_ids
            .write()
            .await
            .entry(key.to_string())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone()
    }

    // Internal: GET with retry on transient failures
    async fn get_with_retry(&self, city: &str) -> Result<CurrentWeather, IngestError> {
        let url = format!("{}/data/2.5/weather", self.config.base_url.trim_end_matches('/'));
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
                tracing::debug!(city, attempt, "Retrying weather request");
            }

            let request = self.http_client.get(&url).query(&[
                ("q", city),
                ("units", "metric"),
                ("appid", self.config.api_key.as_str()),
            ]);

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<CurrentWeather>()
                        .await
                        .map_err(|e| IngestError::ParseError(e.to_string()));
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let error = IngestError::HttpError {
                        status,
                        message: response.text().await.unwrap_or_default(),
                    };
                    if !error.is_recoverable() {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    last_error = Some(IngestError::NetworkError(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::NetworkError("Unknown error".to_string())))
    }
}

// ============================================================================
// Ingest Errors
// ============================================================================

/// Weather ingestion errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum IngestError {
    /// No API key configured
    #[error("no weather API key configured")]
    MissingApiKey,

    /// Initialization error
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("HTTP error ({status}): {message}")]
    HttpError { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Converted measurement failed validation
    #[error("Invalid measurement: {0}")]
    Invalid(#[from] ValidationError),
}

impl IngestError {
    /// Whether a retry could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NetworkError(_) => true,
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO: &str = r#"{
        "main": {"temp": 33.4, "humidity": 70},
        "wind": {"speed": 6.2, "deg": 135},
        "rain": {"1h": 2.5},
        "name": "Tokyo",
        "sys": {"country": "JP"}
    }"#;

    fn client() -> OpenWeatherMapClient {
        OpenWeatherMapClient::new(WeatherClientConfig::new("http://localhost:9", "key")).unwrap()
    }

    #[test]
    fn test_client_config_creation() {
        let config = WeatherClientConfig::new("https://api.openweathermap.org", "abc")
            .with_timeout(Duration::from_secs(5))
            .with_retry_count(0);

        assert_eq!(config.api_key, "abc");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_count, 0);
    }

    #[test]
    fn test_config_from_ingest_requires_key() {
        let mut ingest = IngestConfig::default();
        assert!(matches!(
            WeatherClientConfig::from_ingest(&ingest),
            Err(IngestError::MissingApiKey)
        ));

        ingest.api_key = Some("k".to_string());
        let config = WeatherClientConfig::from_ingest(&ingest).unwrap();
        assert_eq!(config.base_url, "https://api.openweathermap.org");
    }

    #[tokio::test]
    async fn test_response_conversion() {
        let weather: CurrentWeather = serde_json::from_str(TOKYO).unwrap();
        let measurement = client().to_measurement(weather).await.unwrap();

        assert_eq!(measurement.location_name, "Tokyo, JP");
        assert_eq!(measurement.temperature, 33.4);
        assert_eq!(measurement.humidity, 70.0);
        assert_eq!(measurement.wind_direction, WindDirection::SE);
        assert_eq!(measurement.precipitation, 2.5);
    }

    #[tokio::test]
    async fn test_missing_rain_defaults_to_zero() {
        let body = r#"{
            "main": {"temp": 18.0, "humidity": 55},
            "wind": {"speed": 3.0, "deg": 350},
            "name": "London",
            "sys": {"country": "GB"}
        }"#;
        let weather: CurrentWeather = serde_json::from_str(body).unwrap();
        let measurement = client().to_measurement(weather).await.unwrap();

        assert_eq!(measurement.precipitation, 0.0);
        assert_eq!(measurement.wind_direction, WindDirection::N);
    }

    #[tokio::test]
    async fn test_location_ids_are_stable_per_city() {
        let client = client();
        let first = client.location_id_for("Tokyo,JP").await;
        let second = client.location_id_for("Tokyo,JP").await;
        let other = client.location_id_for("Paris,FR").await;

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_error_recoverability() {
        assert!(IngestError::NetworkError("reset".into()).is_recoverable());
        assert!(IngestError::HttpError { status: 503, message: String::new() }.is_recoverable());
        assert!(!IngestError::HttpError { status: 401, message: String::new() }.is_recoverable());
        assert!(!IngestError::MissingApiKey.is_recoverable());
    }
}
