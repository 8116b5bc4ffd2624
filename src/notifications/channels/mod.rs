//! Notification channels for delivering alerts
//!
//! A channel is the narrow interface to an external delivery provider. The
//! router only decides which channels receive an alert; how a channel delivers
//! (and whether it retries) is the channel's own business.

pub mod logging;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Alert;

use super::ChannelKind;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Channel temporarily unavailable
    #[error("Channel temporarily unavailable: {0}")]
    Unavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// No channel registered for a kind the routing policy asked for
    #[error("No channel registered for {0}")]
    NotRegistered(ChannelKind),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

/// Response from sending a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the notification was successfully delivered
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the notification
    pub channel: ChannelKind,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: ChannelKind) -> Self {
        Self {
            success: true,
            channel,
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a successful delivery status with a message
    pub fn success_with_message(channel: ChannelKind, message: impl Into<String>) -> Self {
        Self {
            success: true,
            channel,
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: ChannelKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel,
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// Trait for notification channels
///
/// Implement this trait to plug in a real email, SMS or push provider.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Which fan-out slot this channel fills
    fn kind(&self) -> ChannelKind;

    /// Human-readable channel name for logs
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Send an alert through this channel
    async fn send(&self, alert: &Alert) -> ChannelResult<DeliveryStatus>;

    /// Check if the channel is available
    async fn health_check(&self) -> ChannelResult<bool> {
        Ok(true)
    }
}
