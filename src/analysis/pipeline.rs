//! Analysis pipeline orchestration
//!
//! ```text
//! Measurement ─▶ validate ─▶ TrendTracker.update ─▶ RuleEngine.evaluate ─▶ [Alert]
//!                                                                            │
//!                                      ┌─────────────── egress ──────────────┘
//!                                      ▼
//!                     Publish: AlertPublisher.publish(alert)   (bus consumer calls on_alert)
//!                     Inline:  on_alert(alert)
//!
//! on_alert: AlertHistoryStore.append ─▶ AlertRouter.dispatch
//! ```

use std::sync::Arc;

use super::rules::{RuleEngine, Thresholds};
use super::trend::{TrendTracker, DEFAULT_TREND_CAPACITY, DEFAULT_TREND_WINDOW_MINUTES};
use crate::bus::AlertPublisher;
use crate::config::AnalysisConfig;
use crate::history::{AlertHistoryStore, DEFAULT_HISTORY_CAPACITY};
use crate::metrics;
use crate::models::{Alert, Measurement, ValidationError};
use crate::notifications::{AlertRouter, DispatchReport};

/// Where generated alerts go after evaluation
#[derive(Clone)]
pub enum AlertEgress {
    /// Append and dispatch in-process, in the caller's task
    Inline,
    /// Hand off to a bus producer; a consumer calls `on_alert` later
    Publish(Arc<dyn AlertPublisher>),
}

impl std::fmt::Debug for AlertEgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => f.write_str("Inline"),
            Self::Publish(_) => f.write_str("Publish"),
        }
    }
}

/// Measurement-to-alert pipeline
///
/// Cheap to share behind an `Arc`; every component is either stateless or
/// internally synchronized.
pub struct AnalysisPipeline {
    tracker: TrendTracker,
    engine: RuleEngine,
    history: Arc<AlertHistoryStore>,
    router: AlertRouter,
    egress: AlertEgress,
}

impl AnalysisPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Inbound entry point for measurements
    ///
    /// Rejects malformed measurements before they touch any state. Returns the
    /// alerts generated, in evaluation order.
    pub async fn on_measurement(&self, measurement: Measurement) -> Result<Vec<Alert>, ValidationError> {
        if let Err(e) = measurement.validate() {
            metrics::record_measurement_rejected();
            tracing::warn!(
                location_id = %measurement.location_id,
                error = %e,
                "Rejected measurement"
            );
            return Err(e);
        }
        metrics::record_measurement_accepted();

        tracing::debug!(
            location_id = %measurement.location_id,
            temperature = measurement.temperature,
            wind_speed = measurement.wind_speed,
            precipitation = measurement.precipitation,
            "Processing measurement"
        );

        let trend = self
            .tracker
            .update(
                &measurement.location_id,
                &measurement.location_name,
                measurement.temperature,
                measurement.timestamp,
            )
            .await;

        let alerts = self.engine.evaluate(
            &measurement,
            trend.temperature_delta,
            trend.has_sufficient_history,
        );

        for alert in &alerts {
            metrics::record_alert_generated(alert.alert_type.as_str(), alert.severity.as_str());
            tracing::info!(
                location_id = %alert.location_id,
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                value = alert.value,
                "Alert generated"
            );
            self.emit(alert).await;
        }

        Ok(alerts)
    }

    async fn emit(&self, alert: &Alert) {
        match &self.egress {
            AlertEgress::Inline => {
                self.on_alert(alert.clone()).await;
            }
            AlertEgress::Publish(publisher) => {
                if let Err(e) = publisher.publish(alert).await {
                    tracing::error!(
                        alert_id = %alert.alert_id,
                        location_id = %alert.location_id,
                        error = %e,
                        "Failed to publish alert"
                    );
                }
            }
        }
    }

    /// Notification-side entry point: record the alert, then fan it out
    ///
    /// Channel failures are reported in the returned [`DispatchReport`] and
    /// never fail the call.
    pub async fn on_alert(&self, alert: Alert) -> DispatchReport {
        let evicted = self.history.append(alert.clone()).await;
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted oldest alerts from history");
        }
        metrics::update_history_size(self.history.len().await);

        self.router.dispatch(&alert).await
    }

    pub fn history(&self) -> &Arc<AlertHistoryStore> {
        &self.history
    }

    pub fn tracker(&self) -> &TrendTracker {
        &self.tracker
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn router(&self) -> &AlertRouter {
        &self.router
    }

    pub fn egress(&self) -> &AlertEgress {
        &self.egress
    }
}

/// Builder for [`AnalysisPipeline`]
///
/// Defaults: capacity-10 / 30-minute trend window, default thresholds, a
/// 100-alert history, log-only channels and inline egress.
pub struct PipelineBuilder {
    trend_capacity: usize,
    trend_window_minutes: i64,
    thresholds: Thresholds,
    history: Option<Arc<AlertHistoryStore>>,
    history_capacity: usize,
    router: Option<AlertRouter>,
    egress: AlertEgress,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            trend_capacity: DEFAULT_TREND_CAPACITY,
            trend_window_minutes: DEFAULT_TREND_WINDOW_MINUTES,
            thresholds: Thresholds::default(),
            history: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            router: None,
            egress: AlertEgress::Inline,
        }
    }
}

impl PipelineBuilder {
    /// Apply the `[analysis]` section of the configuration
    pub fn analysis_config(mut self, config: &AnalysisConfig) -> Self {
        self.trend_capacity = config.trend_capacity;
        self.trend_window_minutes = config.trend_window_minutes;
        self.history_capacity = config.history_capacity;
        self
    }

    pub fn trend_settings(mut self, capacity: usize, window_minutes: i64) -> Self {
        self.trend_capacity = capacity;
        self.trend_window_minutes = window_minutes;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Share an existing history store instead of creating one
    pub fn history(mut self, history: Arc<AlertHistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn router(mut self, router: AlertRouter) -> Self {
        self.router = Some(router);
        self
    }

    /// Send alerts through `publisher` instead of handling them inline
    pub fn publisher(mut self, publisher: Arc<dyn AlertPublisher>) -> Self {
        self.egress = AlertEgress::Publish(publisher);
        self
    }

    pub fn build(self) -> AnalysisPipeline {
        let history_capacity = self.history_capacity;
        AnalysisPipeline {
            tracker: TrendTracker::with_settings(self.trend_capacity, self.trend_window_minutes),
            engine: RuleEngine::with_thresholds(self.thresholds),
            history: self
                .history
                .unwrap_or_else(|| Arc::new(AlertHistoryStore::with_capacity(history_capacity))),
            router: self.router.unwrap_or_else(AlertRouter::with_log_channels),
            egress: self.egress,
        }
    }
}
