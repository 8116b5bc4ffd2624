//! Notification fan-out for weather alerts
//!
//! Alerts are routed to notification channels by severity. The routing table
//! is fixed; channels are pluggable behind the [`Channel`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              AlertRouter                   │
//! │  - Severity → channel lookup               │
//! │  - Concurrent, isolated delivery           │
//! │  - Delivery metrics and logging            │
//! └────────────────────────────────────────────┘
//!                     │
//!         ┌───────────┼───────────┐
//!         ▼           ▼           ▼
//!   ┌─────────┐ ┌─────────┐ ┌─────────┐
//!   │  Email  │ │   SMS   │ │  Push   │
//!   │ Channel │ │ Channel │ │ Channel │
//!   └─────────┘ └─────────┘ └─────────┘
//! ```
//!
//! # Routing
//!
//! | Severity | Channels            |
//! |----------|---------------------|
//! | HIGH     | email, sms, push    |
//! | MEDIUM   | email, push         |
//! | LOW      | email               |
//!
//! # Example
//!
//! ```rust,ignore
//! use stormwatch::notifications::AlertRouter;
//!
//! let router = AlertRouter::with_log_channels();
//! let report = router.dispatch(&alert).await;
//! assert!(report.all_delivered());
//! ```

pub mod channels;
mod manager;
pub mod routing;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Alert;

// Re-exports
pub use channels::logging::LogChannel;
pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};
pub use manager::{AlertRouter, DispatchReport};
pub use routing::RoutingPolicy;

/// The notification sinks an alert can be fanned out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
    Push,
}

impl ChannelKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
        }
    }

    /// Render the alert the way this kind of provider expects it
    pub fn render(&self, alert: &Alert) -> String {
        match self {
            Self::Email => format!("WEATHER ALERT - {} - {}", alert.severity, alert.message),
            Self::Sms => format!("URGENT: {} - {}", alert.alert_type, alert.message),
            Self::Push => format!("{} - {}", alert.alert_type, alert.message),
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Email, Self::Sms, Self::Push]
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
