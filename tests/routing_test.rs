//! Severity-based fan-out through the pipeline's notification side

mod common;

use chrono::Utc;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stormwatch::analysis::AnalysisPipeline;
use stormwatch::config::NotificationConfig;
use stormwatch::models::{AlertType, Severity};
use stormwatch::notifications::{AlertRouter, ChannelKind, RoutingPolicy};

use common::{alert_with, RecordingChannel};

fn router_with(email: RecordingChannel, sms: RecordingChannel, push: RecordingChannel) -> AlertRouter {
    AlertRouter::new()
        .with_channel(Arc::new(email))
        .with_channel(Arc::new(sms))
        .with_channel(Arc::new(push))
}

async fn dispatch_counts(severity: Severity) -> (usize, usize, usize) {
    let email = RecordingChannel::new(ChannelKind::Email);
    let sms = RecordingChannel::new(ChannelKind::Sms);
    let push = RecordingChannel::new(ChannelKind::Push);
    let (email_seen, sms_seen, push_seen) = (email.handle(), sms.handle(), push.handle());
    let router = router_with(email, sms, push);

    let alert = alert_with("a-1", "loc-1", AlertType::HeavyRainfall, severity, Utc::now());
    router.dispatch(&alert).await;

    let email_count = email_seen.lock().unwrap().len();
    let sms_count = sms_seen.lock().unwrap().len();
    let push_count = push_seen.lock().unwrap().len();
    (email_count, sms_count, push_count)
}

#[tokio::test]
async fn test_high_reaches_all_three_channels() {
    assert_eq!(dispatch_counts(Severity::High).await, (1, 1, 1));
}

#[tokio::test]
async fn test_medium_reaches_email_and_push() {
    assert_eq!(dispatch_counts(Severity::Medium).await, (1, 0, 1));
}

#[tokio::test]
async fn test_low_reaches_email_only() {
    assert_eq!(dispatch_counts(Severity::Low).await, (1, 0, 0));
}

#[tokio::test]
async fn test_channel_failure_is_isolated() {
    let email = RecordingChannel::failing(ChannelKind::Email);
    let sms = RecordingChannel::new(ChannelKind::Sms);
    let push = RecordingChannel::new(ChannelKind::Push);
    let (email_seen, sms_seen, push_seen) = (email.handle(), sms.handle(), push.handle());

    let pipeline = AnalysisPipeline::builder()
        .router(router_with(email, sms, push))
        .build();

    let alert = alert_with("a-9", "loc-9", AlertType::ExtremeWind, Severity::High, Utc::now());
    let report = pipeline.on_alert(alert).await;

    // Every channel was attempted despite the email failure
    assert_eq!(email_seen.lock().unwrap().len(), 1);
    assert_eq!(sms_seen.lock().unwrap().len(), 1);
    assert_eq!(push_seen.lock().unwrap().len(), 1);

    assert!(!report.all_delivered());
    assert_eq!(report.failures().count(), 1);

    // The alert is still recorded
    assert_eq!(pipeline.history().recent().await[0].alert_id, "a-9");
}

#[test]
fn test_policy_table_is_data() {
    let policy = RoutingPolicy;
    let widths: Vec<usize> = policy.table().iter().map(|(_, c)| c.len()).collect();
    assert_eq!(widths, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_configured_push_webhook_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push"))
        .and(header("authorization", "Bearer push-secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = NotificationConfig {
        push_webhook_url: Some(format!("{}/push", server.uri())),
        push_webhook_token: Some("push-secret".to_string()),
        ..NotificationConfig::default()
    };
    let router = AlertRouter::from_config(&config).unwrap();

    let alert = alert_with("a-3", "loc-3", AlertType::HighWind, Severity::Medium, Utc::now());
    let report = router.dispatch(&alert).await;

    assert!(report.all_delivered());
    assert_eq!(report.channels(), vec![ChannelKind::Email, ChannelKind::Push]);
}
