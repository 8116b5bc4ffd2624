//! stormwatch - Weather measurement analysis and alerting
//!
//! Ingests per-location weather measurements, detects hazardous conditions,
//! fans the resulting alerts out to notification channels and keeps a
//! queryable recent-alert history.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Measurements, alerts, severities and validation
//! - [`analysis`] - Trend tracking, rule evaluation and the pipeline
//! - [`history`] - Bounded alert history with filtered retrieval
//! - [`notifications`] - Severity-based routing to notification channels
//! - [`bus`] - In-process alert bus between analysis and notification sides
//! - [`ingest`] - Weather API client and poller
//! - [`server`] - HTTP ingestion and query endpoints
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use stormwatch::analysis::AnalysisPipeline;
//! use stormwatch::models::MeasurementInput;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = AnalysisPipeline::builder().build();
//!     let input: MeasurementInput = serde_json::from_str(
//!         r#"{"locationId":"loc-1","locationName":"Cairo, EG","temperature":41.0,
//!             "humidity":12.0,"windSpeed":4.0,"windDirection":"N","precipitation":0.0}"#,
//!     )?;
//!     let alerts = pipeline.on_measurement(input.into_measurement(chrono::Utc::now())?).await?;
//!     for alert in alerts {
//!         println!("{alert}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod bus;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod server;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analysis::{AnalysisPipeline, RuleEngine, TrendTracker};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, StormwatchErrorTrait};
    pub use crate::history::AlertHistoryStore;
    pub use crate::models::{Alert, AlertType, Measurement, MeasurementInput, Severity};
    pub use crate::notifications::{AlertRouter, ChannelKind};
}

// Direct re-exports for convenience
pub use models::{Alert, AlertType, Measurement, Severity};
