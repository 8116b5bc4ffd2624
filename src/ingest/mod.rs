//! Measurement ingestion from an external weather API
//!
//! ```text
//! ┌──────────────┐  tick   ┌───────────────────────┐  Measurement  ┌──────────────────┐
//! │ WeatherPoller│────────▶│ OpenWeatherMapClient  │──────────────▶│ AnalysisPipeline │
//! │ (random city)│         │ GET /data/2.5/weather │               │  on_measurement  │
//! └──────────────┘         └───────────────────────┘               └──────────────────┘
//! ```

pub mod client;
pub mod poller;

pub use client::{IngestError, OpenWeatherMapClient, WeatherClientConfig};
pub use poller::WeatherPoller;
