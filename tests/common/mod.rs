//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stormwatch::models::{Alert, AlertType, Measurement, Severity, WindDirection};
use stormwatch::notifications::{Channel, ChannelError, ChannelKind, ChannelResult, DeliveryStatus};

/// A calm measurement that triggers no rule
pub fn calm_measurement(location_id: &str) -> Measurement {
    Measurement {
        location_id: location_id.to_string(),
        location_name: format!("{location_id} city"),
        temperature: 20.0,
        humidity: 50.0,
        wind_speed: 3.0,
        wind_direction: WindDirection::W,
        precipitation: 0.0,
        timestamp: Utc::now(),
    }
}

/// Measurement with the given temperature and timestamp, otherwise calm
pub fn temperature_at(location_id: &str, temperature: f64, timestamp: DateTime<Utc>) -> Measurement {
    Measurement {
        temperature,
        timestamp,
        ..calm_measurement(location_id)
    }
}

/// Alert with explicit identity and timestamp
pub fn alert_with(
    alert_id: &str,
    location_id: &str,
    alert_type: AlertType,
    severity: Severity,
    timestamp: DateTime<Utc>,
) -> Alert {
    Alert {
        alert_id: alert_id.to_string(),
        location_id: location_id.to_string(),
        location_name: format!("{location_id} city"),
        alert_type,
        message: format!("{alert_type} at {location_id}"),
        value: 1.0,
        severity,
        timestamp,
    }
}

/// Channel that records every alert id it receives
pub struct RecordingChannel {
    kind: ChannelKind,
    fail: bool,
    delay: Option<Duration>,
    received: Arc<Mutex<Vec<String>>>,
}

impl RecordingChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            fail: false,
            delay: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Takes `delay` per delivery and records only once it completes
    pub fn slow(kind: ChannelKind, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(kind)
        }
    }

    /// Records the call, then fails
    pub fn failing(kind: ChannelKind) -> Self {
        Self {
            fail: true,
            ..Self::new(kind)
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.received)
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, alert: &Alert) -> ChannelResult<DeliveryStatus> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.received.lock().unwrap().push(alert.alert_id.clone());
        if self.fail {
            return Err(ChannelError::Unavailable("provider down".to_string()));
        }
        Ok(DeliveryStatus::success(self.kind))
    }
}
