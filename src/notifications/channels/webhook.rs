//! Webhook notification channel
//!
//! Delivers alerts as JSON via HTTP POST. Used for push delivery when a push
//! gateway URL is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::models::Alert;
use crate::notifications::ChannelKind;

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional authentication token (sent as Bearer token)
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook notification channel
///
/// # Payload Format
///
/// ```json
/// {
///   "alertId": "alert-uuid",
///   "locationId": "loc-1",
///   "locationName": "Sydney, AU",
///   "alertType": "EXTREME_WIND",
///   "severity": "HIGH",
///   "value": 27.5,
///   "message": "Dangerous wind speeds of 27.5 m/s detected at Sydney, AU",
///   "notification": "EXTREME_WIND - Dangerous wind speeds of 27.5 m/s detected at Sydney, AU",
///   "timestamp": "2024-01-01T12:00:00Z"
/// }
/// ```
pub struct WebhookChannel {
    kind: ChannelKind,
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new webhook channel filling the `kind` slot
    pub fn new(kind: ChannelKind, config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            kind,
            config,
            client,
        })
    }

    /// Create a push webhook with just a URL
    pub fn push(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(ChannelKind::Push, WebhookConfig::new(url))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_payload(&self, alert: &Alert) -> serde_json::Value {
        serde_json::json!({
            "alertId": alert.alert_id,
            "locationId": alert.location_id,
            "locationName": alert.location_name,
            "alertType": alert.alert_type,
            "severity": alert.severity,
            "value": alert.value,
            "message": alert.message,
            "notification": self.kind.render(alert),
            "timestamp": alert.timestamp.to_rfc3339(),
        })
    }

    async fn send_with_retry(&self, payload: &serde_json::Value) -> ChannelResult<()> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s...
                let delay = Duration::from_secs(2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                tracing::debug!(
                    "Retrying webhook request (attempt {}/{})",
                    attempt + 1,
                    self.config.max_retries + 1
                );
            }

            let mut request = self.client.post(&self.config.url);
            if let Some(token) = &self.config.auth_token {
                request = request.bearer_auth(token);
            }

            match request.json(payload).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    last_error = Some(ChannelError::Other(format!("HTTP {status}: {body}")));

                    // Don't retry on client errors (4xx)
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => last_error = Some(ChannelError::HttpError(e)),
            }
        }

        Err(last_error.unwrap_or_else(|| ChannelError::Other("Unknown error".to_string())))
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, alert: &Alert) -> ChannelResult<DeliveryStatus> {
        let payload = self.build_payload(alert);
        self.send_with_retry(&payload).await?;

        tracing::info!(channel = %self.kind, url = %self.config.url, alert_id = %alert.alert_id, "Webhook delivered");
        Ok(DeliveryStatus::success_with_message(
            self.kind,
            format!("Delivered to {}", self.config.url),
        ))
    }

    async fn health_check(&self) -> ChannelResult<bool> {
        match self.client.head(&self.config.url).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Webhook health check failed for {}: {}", self.config.url, e);
                Ok(false)
            }
        }
    }
}
