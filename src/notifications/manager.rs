//! Alert router: severity-based fan-out to notification channels

use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use super::routing::RoutingPolicy;
use super::{ChannelKind, LogChannel, WebhookChannel, WebhookConfig};
use crate::config::NotificationConfig;
use crate::metrics;
use crate::models::Alert;

/// Outcome of fanning one alert out
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub alert_id: String,
    /// One entry per channel invoked, in routing order
    pub deliveries: Vec<DeliveryStatus>,
}

impl DispatchReport {
    /// Channels that were invoked, in routing order
    pub fn channels(&self) -> Vec<ChannelKind> {
        self.deliveries.iter().map(|d| d.channel).collect()
    }

    pub fn all_delivered(&self) -> bool {
        self.deliveries.iter().all(|d| d.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryStatus> {
        self.deliveries.iter().filter(|d| !d.success)
    }
}

/// Routes alerts to channels according to the fixed [`RoutingPolicy`]
///
/// Each channel is invoked independently and concurrently. A failing channel
/// is logged and reported but never prevents delivery to the others. The
/// router does not retry.
#[derive(Clone, Default)]
pub struct AlertRouter {
    policy: RoutingPolicy,
    channels: HashMap<ChannelKind, Arc<dyn Channel>>,
}

impl AlertRouter {
    /// Create a router with no channels registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router whose email, SMS and push channels only log
    pub fn with_log_channels() -> Self {
        let mut router = Self::new();
        for kind in ChannelKind::all() {
            router.register(Arc::new(LogChannel::new(kind)));
        }
        router
    }

    /// Log channels for every kind, with push replaced by a webhook when one
    /// is configured
    pub fn from_config(config: &NotificationConfig) -> ChannelResult<Self> {
        let mut router = Self::with_log_channels();

        if let Some(url) = &config.push_webhook_url {
            let mut webhook = WebhookConfig::new(url.clone()).with_timeout(config.webhook_timeout_secs);
            if let Some(token) = &config.push_webhook_token {
                webhook = webhook.with_auth_token(token.clone());
            }
            router.register(Arc::new(WebhookChannel::new(ChannelKind::Push, webhook)?));
            tracing::info!(url = %url, "Push notifications delivered via webhook");
        }

        Ok(router)
    }

    /// Register (or replace) the channel for its kind
    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        self.channels.insert(channel.kind(), channel);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.register(channel);
        self
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Health of every registered channel
    ///
    /// A channel whose check errors counts as unhealthy.
    pub async fn health(&self) -> BTreeMap<ChannelKind, bool> {
        let checks = self.channels.iter().map(|(kind, channel)| async move {
            let healthy = match channel.health_check().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    tracing::warn!(channel = %kind, error = %e, "Channel health check failed");
                    false
                }
            };
            (*kind, healthy)
        });
        join_all(checks).await.into_iter().collect()
    }

    /// Fan an alert out to every channel its severity requires
    pub async fn dispatch(&self, alert: &Alert) -> DispatchReport {
        let targets = self.policy.channels_for(alert.severity);

        let sends = targets.iter().map(|kind| self.deliver(*kind, alert));
        let deliveries = join_all(sends).await;

        DispatchReport {
            alert_id: alert.alert_id.clone(),
            deliveries,
        }
    }

    async fn deliver(&self, kind: ChannelKind, alert: &Alert) -> DeliveryStatus {
        let result = match self.channels.get(&kind) {
            Some(channel) => channel.send(alert).await,
            None => Err(ChannelError::NotRegistered(kind)),
        };

        let status = match result {
            Ok(status) => status,
            Err(e) => DeliveryStatus::failure(kind, e.to_string()),
        };

        if status.success {
            metrics::record_notification(kind.as_str(), "success");
        } else {
            metrics::record_notification(kind.as_str(), "failure");
            tracing::error!(
                channel = %kind,
                alert_id = %alert.alert_id,
                severity = %alert.severity,
                error = status.message.as_deref().unwrap_or("unknown"),
                "Failed to send alert to channel"
            );
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertType, Severity};
    use crate::notifications::channels::ChannelResult;
    use async_trait::async_trait;
    use chrono::Utc;

    struct BrokenChannel(ChannelKind);

    #[async_trait]
    impl Channel for BrokenChannel {
        fn kind(&self) -> ChannelKind {
            self.0
        }

        async fn send(&self, _alert: &Alert) -> ChannelResult<DeliveryStatus> {
            Err(ChannelError::Unavailable("gateway down".to_string()))
        }

        async fn health_check(&self) -> ChannelResult<bool> {
            Err(ChannelError::Unavailable("gateway down".to_string()))
        }
    }

    fn alert(severity: Severity) -> Alert {
        Alert {
            alert_id: "a-1".to_string(),
            location_id: "loc-1".to_string(),
            location_name: "Paris, FR".to_string(),
            alert_type: AlertType::HeavyRainfall,
            message: "Heavy rainfall of 7.0 mm/h detected at Paris, FR".to_string(),
            value: 7.0,
            severity,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_follows_policy() {
        let router = AlertRouter::with_log_channels();

        let high = router.dispatch(&alert(Severity::High)).await;
        assert_eq!(high.channels(), vec![ChannelKind::Email, ChannelKind::Sms, ChannelKind::Push]);
        assert!(high.all_delivered());

        let medium = router.dispatch(&alert(Severity::Medium)).await;
        assert_eq!(medium.channels(), vec![ChannelKind::Email, ChannelKind::Push]);

        let low = router.dispatch(&alert(Severity::Low)).await;
        assert_eq!(low.channels(), vec![ChannelKind::Email]);
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let router =
            AlertRouter::with_log_channels().with_channel(Arc::new(BrokenChannel(ChannelKind::Sms)));

        let report = router.dispatch(&alert(Severity::High)).await;
        assert_eq!(report.deliveries.len(), 3);
        assert!(!report.all_delivered());

        let failed: Vec<ChannelKind> = report.failures().map(|d| d.channel).collect();
        assert_eq!(failed, vec![ChannelKind::Sms]);
    }

    #[test]
    fn test_from_config_validates_webhook() {
        let mut config = NotificationConfig::default();
        assert!(AlertRouter::from_config(&config).is_ok());

        config.push_webhook_url = Some("https://push.example.com/alerts".to_string());
        assert!(AlertRouter::from_config(&config).is_ok());

        config.push_webhook_url = Some("push.example.com".to_string());
        assert!(matches!(
            AlertRouter::from_config(&config),
            Err(ChannelError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_channel_is_reported() {
        let router = AlertRouter::new().with_channel(Arc::new(LogChannel::email()));

        let report = router.dispatch(&alert(Severity::Medium)).await;
        assert_eq!(report.channels(), vec![ChannelKind::Email, ChannelKind::Push]);
        assert!(report.deliveries[0].success);
        assert!(!report.deliveries[1].success);
    }

    #[tokio::test]
    async fn test_health_reports_each_channel() {
        let router =
            AlertRouter::with_log_channels().with_channel(Arc::new(BrokenChannel(ChannelKind::Sms)));

        let health = router.health().await;
        assert_eq!(health.len(), 3);
        assert!(health[&ChannelKind::Email]);
        assert!(!health[&ChannelKind::Sms]);
        assert!(health[&ChannelKind::Push]);
    }
}
