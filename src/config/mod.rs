//! Configuration management for stormwatch
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerSettings,

    /// Trend, history and bus sizing
    pub analysis: AnalysisConfig,

    /// Weather API polling
    pub ingest: IngestConfig,

    /// Notification channel configuration
    pub notifications: NotificationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Enable permissive CORS
    pub enable_cors: bool,

    /// Trace every HTTP request
    pub enable_request_logging: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0:8080"),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

/// Analysis core sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Readings retained per location
    pub trend_capacity: usize,

    /// Lookback for the rapid-change baseline
    pub trend_window_minutes: i64,

    /// Alerts retained in history
    pub history_capacity: usize,

    /// Alert bus buffer size
    pub bus_buffer: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_capacity: 10,
            trend_window_minutes: 30,
            history_capacity: 100,
            bus_buffer: 1024,
        }
    }
}

/// Weather API polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Run the poller alongside the server
    pub enabled: bool,

    /// Base URL of the OpenWeatherMap-compatible API
    pub api_base_url: String,

    /// API key (required when enabled)
    pub api_key: Option<String>,

    /// Seconds between polls
    pub poll_interval_secs: u64,

    /// Cities fetched immediately at startup
    pub initial_fetch_count: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Cities as `"<name>,<country code>"`
    pub cities: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: String::from("https://api.openweathermap.org"),
            api_key: None,
            poll_interval_secs: 300,
            initial_fetch_count: 3,
            request_timeout_secs: 30,
            cities: default_cities(),
        }
    }
}

fn default_cities() -> Vec<String> {
    [
        "London,uk",
        "New York,us",
        "Tokyo,jp",
        "Sydney,au",
        "Paris,fr",
        "Berlin,de",
        "Cairo,eg",
        "Mumbai,in",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl IngestConfig {
    /// Time between scheduled polls
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Per-request timeout for the weather API
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// When set, push notifications are POSTed here
    pub push_webhook_url: Option<String>,

    /// Bearer token sent with every push webhook request
    pub push_webhook_token: Option<String>,

    /// Webhook request timeout in seconds
    pub webhook_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            push_webhook_url: None,
            push_webhook_token: None,
            webhook_timeout_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

impl LoggingConfig {
    /// Settings after command-line flags are applied
    ///
    /// `--verbose` forces `debug`; `--log-format` replaces the configured
    /// format. Anything not given on the command line keeps its configured
    /// value.
    #[must_use]
    pub fn with_overrides(&self, verbose: bool, format: Option<&str>) -> Self {
        Self {
            level: if verbose {
                String::from("debug")
            } else {
                self.level.clone()
            },
            format: format.map_or_else(|| self.format.clone(), String::from),
        }
    }

    /// `EnvFilter` directive for the configured level
    pub fn filter_directive(&self) -> String {
        format!("stormwatch={0},tower_http={0},warn", self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_address =
            std::env::var("STORMWATCH_BIND_ADDRESS").unwrap_or(defaults.server.bind_address);

        let cities = std::env::var("STORMWATCH_CITIES")
            .map(|v| {
                v.split(';')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.ingest.cities);

        Ok(Self {
            server: ServerSettings {
                bind_address,
                enable_cors: env_or("STORMWATCH_ENABLE_CORS", defaults.server.enable_cors),
                enable_request_logging: env_or(
                    "STORMWATCH_ENABLE_REQUEST_LOGGING",
                    defaults.server.enable_request_logging,
                ),
            },
            analysis: AnalysisConfig {
                trend_capacity: env_or("STORMWATCH_TREND_CAPACITY", defaults.analysis.trend_capacity),
                trend_window_minutes: env_or(
                    "STORMWATCH_TREND_WINDOW_MINUTES",
                    defaults.analysis.trend_window_minutes,
                ),
                history_capacity: env_or(
                    "STORMWATCH_HISTORY_CAPACITY",
                    defaults.analysis.history_capacity,
                ),
                bus_buffer: env_or("STORMWATCH_BUS_BUFFER", defaults.analysis.bus_buffer),
            },
            ingest: IngestConfig {
                enabled: env_or("STORMWATCH_INGEST_ENABLED", defaults.ingest.enabled),
                api_base_url: std::env::var("STORMWATCH_API_BASE_URL")
                    .unwrap_or(defaults.ingest.api_base_url),
                api_key: std::env::var("OPENWEATHERMAP_API_KEY").ok(),
                poll_interval_secs: env_or(
                    "STORMWATCH_POLL_INTERVAL_SECS",
                    defaults.ingest.poll_interval_secs,
                ),
                initial_fetch_count: env_or(
                    "STORMWATCH_INITIAL_FETCH_COUNT",
                    defaults.ingest.initial_fetch_count,
                ),
                request_timeout_secs: env_or(
                    "STORMWATCH_REQUEST_TIMEOUT",
                    defaults.ingest.request_timeout_secs,
                ),
                cities,
            },
            notifications: NotificationConfig {
                push_webhook_url: std::env::var("STORMWATCH_PUSH_WEBHOOK_URL").ok(),
                push_webhook_token: std::env::var("STORMWATCH_PUSH_WEBHOOK_TOKEN").ok(),
                webhook_timeout_secs: env_or(
                    "STORMWATCH_WEBHOOK_TIMEOUT",
                    defaults.notifications.webhook_timeout_secs,
                ),
            },
            logging: LoggingConfig {
                level: std::env::var("STORMWATCH_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: std::env::var("STORMWATCH_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.analysis.trend_capacity == 0 {
            anyhow::bail!("trend_capacity must be greater than 0");
        }

        if self.analysis.trend_window_minutes <= 0 {
            anyhow::bail!("trend_window_minutes must be positive");
        }

        if self.analysis.history_capacity == 0 {
            anyhow::bail!("history_capacity must be greater than 0");
        }

        if self.analysis.bus_buffer == 0 {
            anyhow::bail!("bus_buffer must be greater than 0");
        }

        if self.ingest.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if self.ingest.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.ingest.enabled {
            if self.ingest.api_key.as_deref().map_or(true, str::is_empty) {
                anyhow::bail!("ingest is enabled but no API key is configured");
            }
            if self.ingest.cities.is_empty() {
                anyhow::bail!("ingest is enabled but the city list is empty");
            }
        }

        if let Some(url) = &self.notifications.push_webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("push_webhook_url must start with http:// or https://");
            }
        }

        if self.notifications.webhook_timeout_secs == 0 {
            anyhow::bail!("webhook_timeout_secs must be greater than 0");
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!("logging format must be text or json, got '{}'", self.logging.format);
        }

        Ok(())
    }

    /// Parsed server bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind_address))
    }
}
