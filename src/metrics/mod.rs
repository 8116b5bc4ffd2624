//! Prometheus metrics for the analysis pipeline
//!
//! This module tracks:
//! - Measurements accepted and rejected at the ingestion boundary
//! - Alerts generated by type and severity
//! - Notification deliveries by channel and outcome
//! - Alert history occupancy
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, CounterVec, Encoder, Gauge, TextEncoder,
};
use std::sync::OnceLock;

use crate::error::{Error, Result};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all pipeline metrics
struct PipelineMetrics {
    measurements: CounterVec,
    alerts_generated: CounterVec,
    notifications: CounterVec,
    history_size: Gauge,
}

/// Global storage; `None` when registration failed
static PIPELINE_METRICS: OnceLock<Option<PipelineMetrics>> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

fn register_all() -> std::result::Result<PipelineMetrics, prometheus::Error> {
    Ok(PipelineMetrics {
        measurements: register_counter_vec!(
            "stormwatch_measurements_total",
            "Measurements received by outcome (accepted, rejected)",
            &["outcome"]
        )?,
        alerts_generated: register_counter_vec!(
            "stormwatch_alerts_generated_total",
            "Alerts generated by the rule engine",
            &["alert_type", "severity"]
        )?,
        notifications: register_counter_vec!(
            "stormwatch_notifications_total",
            "Notification deliveries by channel and status",
            &["channel", "status"]
        )?,
        history_size: register_gauge!(
            "stormwatch_history_size",
            "Number of alerts currently retained in history"
        )?,
    })
}

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; registration happens on the first call only.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = stormwatch::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
///     // Application can continue without metrics
/// }
/// ```
pub fn init_metrics() -> Result<()> {
    let metrics = PIPELINE_METRICS.get_or_init(|| match register_all() {
        Ok(metrics) => {
            tracing::info!("Prometheus metrics initialized successfully");
            Some(metrics)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus metrics registration failed");
            None
        }
    });

    if metrics.is_some() {
        Ok(())
    } else {
        Err(Error::Metrics(prometheus::Error::Msg(
            "metrics registration failed".to_string(),
        )))
    }
}

fn metrics() -> Option<&'static PipelineMetrics> {
    PIPELINE_METRICS.get().and_then(Option::as_ref)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::with_source("Metrics output is not UTF-8", e))
}

/// Record a measurement accepted by the pipeline
pub fn record_measurement_accepted() {
    if let Some(m) = metrics() {
        m.measurements.with_label_values(&["accepted"]).inc();
    }
}

/// Record a measurement rejected at the ingestion boundary
pub fn record_measurement_rejected() {
    if let Some(m) = metrics() {
        m.measurements.with_label_values(&["rejected"]).inc();
    }
}

/// Record an alert produced by the rule engine
pub fn record_alert_generated(alert_type: &str, severity: &str) {
    if let Some(m) = metrics() {
        m.alerts_generated
            .with_label_values(&[alert_type, severity])
            .inc();
    }
}

/// Record a notification delivery attempt
pub fn record_notification(channel: &str, status: &str) {
    if let Some(m) = metrics() {
        m.notifications.with_label_values(&[channel, status]).inc();
    }
}

/// Update the history occupancy gauge
pub fn update_history_size(size: usize) {
    if let Some(m) = metrics() {
        m.history_size.set(size as f64);
    }
}

// ============================================================================
// Tests
// ============================================================================
