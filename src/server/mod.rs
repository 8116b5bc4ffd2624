//! HTTP surface for the analysis pipeline
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  Weather Server                  │
//! │                                                  │
//! │  POST /api/weather              ─▶ on_measurement │
//! │  GET  /api/alerts               ─▶ recent         │
//! │  GET  /api/alerts/location/{id} ─▶ by_location    │
//! │  GET  /api/alerts/type/{type}   ─▶ by_type        │
//! │  GET  /api/health                                │
//! │  GET  /metrics                                   │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stormwatch::server::WeatherServer;
//!
//! let server = WeatherServer::new(&config, pipeline)?;
//! server.start_with_shutdown(shutdown).await?;
//! ```

pub mod api;
#[allow(clippy::module_inception)]
pub mod server;

// Re-export main types
pub use api::{create_router, ApiResponse, ErrorResponse, HealthResponse, MeasurementResponse};
pub use server::{AppState, ServerError, ServerInfo, WeatherServer};
