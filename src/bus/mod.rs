//! In-process alert bus
//!
//! The analysis side publishes every generated alert keyed by location id; a
//! consumer task on the notification side drains the bus and feeds each alert
//! to [`AnalysisPipeline::on_alert`].
//!
//! ```text
//! on_measurement ──publish──▶ [ mpsc (key, alert) ] ──recv──▶ consumer ──▶ on_alert
//!                                                                         ├─ history.append
//!                                                                         └─ router.dispatch
//! ```
//!
//! A single bounded FIFO keeps per-key order. Publishing waits when the
//! buffer is full. On shutdown the consumer closes the bus, finishes every
//! alert already queued and then stops; an alert is never abandoned halfway
//! through `on_alert`.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analysis::AnalysisPipeline;
use crate::models::Alert;

/// Default bus capacity
pub const DEFAULT_BUS_BUFFER: usize = 1024;

/// Errors raised while publishing to the bus
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Every receiver has gone away
    #[error("alert bus is closed")]
    Closed,

    /// Producer-specific failure
    #[error("publish failed: {0}")]
    Other(String),
}

/// Message carried on the bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Partition key (the alert's location id)
    pub key: String,
    pub alert: Alert,
}

impl BusMessage {
    pub fn new(alert: Alert) -> Self {
        Self {
            key: alert.location_id.clone(),
            alert,
        }
    }
}

/// Outbound producer for generated alerts
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    /// Hand one alert to the bus, keyed by its location id
    async fn publish(&self, alert: &Alert) -> Result<(), PublishError>;
}

/// Publisher that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

#[async_trait]
impl AlertPublisher for NullPublisher {
    async fn publish(&self, _alert: &Alert) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Producer half of the in-process bus
#[derive(Debug, Clone)]
pub struct BusPublisher {
    tx: mpsc::Sender<BusMessage>,
}

#[async_trait]
impl AlertPublisher for BusPublisher {
    async fn publish(&self, alert: &Alert) -> Result<(), PublishError> {
        self.tx
            .send(BusMessage::new(alert.clone()))
            .await
            .map_err(|_| PublishError::Closed)
    }
}

/// Consumer half of the in-process bus
#[derive(Debug)]
pub struct BusReceiver {
    rx: mpsc::Receiver<BusMessage>,
}

impl BusReceiver {
    /// Next message, or `None` once every publisher is dropped
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }

    /// Refuse further publishes; queued messages can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Bounded in-process alert bus
pub struct AlertBus;

impl AlertBus {
    /// Create a connected publisher/receiver pair
    pub fn channel(buffer: usize) -> (BusPublisher, BusReceiver) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (BusPublisher { tx }, BusReceiver { rx })
    }
}

/// Spawn the notification-side consumer
///
/// Runs until every publisher is dropped or `shutdown` resolves. On shutdown
/// the bus is closed and the alerts already queued are drained before the
/// task ends. Returns the number of alerts handled.
pub fn spawn_consumer<F>(
    mut receiver: BusReceiver,
    pipeline: Arc<AnalysisPipeline>,
    shutdown: F,
) -> JoinHandle<u64>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::pin!(shutdown);
        let mut draining = false;
        let mut handled = 0u64;

        loop {
            // Only the wait for the next message races shutdown; on_alert always completes
            let message = tokio::select! {
                message = receiver.recv() => message,
                _ = &mut shutdown, if !draining => {
                    tracing::info!("Closing alert bus, draining queued alerts");
                    receiver.close();
                    draining = true;
                    continue;
                }
            };

            let Some(message) = message else { break };

            tracing::debug!(
                key = %message.key,
                alert_id = %message.alert.alert_id,
                "Consuming alert from bus"
            );
            pipeline.on_alert(message.alert).await;
            handled += 1;
        }

        tracing::info!(handled, "Alert bus consumer stopped");
        handled
    })
}
