//! Log-only notification channel
//!
//! Stands in for a real email, SMS or push provider by writing the rendered
//! notification to the tracing log.

use async_trait::async_trait;

use super::{Channel, ChannelResult, DeliveryStatus};
use crate::models::Alert;
use crate::notifications::ChannelKind;

/// Channel that "delivers" by logging the rendered notification
#[derive(Debug, Clone, Copy)]
pub struct LogChannel {
    kind: ChannelKind,
}

impl LogChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }

    pub fn email() -> Self {
        Self::new(ChannelKind::Email)
    }

    pub fn sms() -> Self {
        Self::new(ChannelKind::Sms)
    }

    pub fn push() -> Self {
        Self::new(ChannelKind::Push)
    }
}

#[async_trait]
impl Channel for LogChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, alert: &Alert) -> ChannelResult<DeliveryStatus> {
        let content = self.kind.render(alert);
        tracing::info!(
            channel = %self.kind,
            alert_id = %alert.alert_id,
            location_id = %alert.location_id,
            "Sending {} notification: {}",
            self.kind,
            content
        );
        Ok(DeliveryStatus::success_with_message(self.kind, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertType, Severity};
    use chrono::Utc;

    #[tokio::test]
    async fn test_log_channel_reports_rendered_content() {
        let alert = Alert {
            alert_id: "a-7".to_string(),
            location_id: "loc-3".to_string(),
            location_name: "Berlin, DE".to_string(),
            alert_type: AlertType::LowTemperature,
            message: "Low temperature alert: -3.0°C at Berlin, DE".to_string(),
            value: -3.0,
            severity: Severity::Medium,
            timestamp: Utc::now(),
        };

        let channel = LogChannel::sms();
        assert_eq!(channel.kind(), ChannelKind::Sms);
        assert_eq!(channel.name(), "sms");

        let status = channel.send(&alert).await.unwrap();
        assert!(status.success);
        assert_eq!(status.channel, ChannelKind::Sms);
        assert_eq!(
            status.message.as_deref(),
            Some("URGENT: LOW_TEMPERATURE - Low temperature alert: -3.0°C at Berlin, DE")
        );
    }
}
