//! REST API handlers
//!
//! This module defines the API routes and handlers for measurement ingestion
//! and alert queries.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Error, ErrorCategory, StormwatchErrorTrait};
use crate::metrics;
use crate::models::{Alert, AlertType, Measurement, MeasurementInput, ValidationError};
use crate::notifications::ChannelKind;

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// HTTP status for an error category
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Network => StatusCode::BAD_GATEWAY,
        ErrorCategory::Notification => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::Config | ErrorCategory::Other => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(self.category());
        if status.is_server_error() {
            tracing::error!(category = %self.category(), error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub tracked_locations: usize,
    pub alerts_retained: usize,
    pub ingest_enabled: bool,
    /// Per-channel health; any unhealthy channel marks the service degraded
    pub channels: BTreeMap<ChannelKind, bool>,
}

/// Result of submitting one measurement
#[derive(Debug, Serialize)]
pub struct MeasurementResponse {
    pub measurement: Measurement,
    pub alerts: Vec<Alert>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        // Ingestion
        .route("/api/weather", post(submit_measurement))
        // Alert queries
        .route("/api/alerts", get(recent_alerts))
        .route("/api/alerts/location/{location_id}", get(alerts_by_location))
        .route("/api/alerts/type/{alert_type}", get(alerts_by_type))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = &state.pipeline;

    let channels = pipeline.router().health().await;
    let status = if channels.values().all(|healthy| *healthy) {
        "healthy"
    } else {
        "degraded"
    };

    Json(ApiResponse::success(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        tracked_locations: pipeline.tracker().location_count().await,
        alerts_retained: pipeline.history().len().await,
        ingest_enabled: state.ingest_enabled,
        channels,
    }))
}

/// Prometheus metrics in text exposition format
async fn metrics_endpoint() -> Result<Response, Error> {
    let body = metrics::encode_metrics()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

// ============================================================================
// Ingestion Handlers
// ============================================================================

/// Submit one measurement to the analysis pipeline
async fn submit_measurement(
    State(state): State<AppState>,
    payload: Result<Json<MeasurementInput>, JsonRejection>,
) -> Result<Response, Error> {
    let measurement = payload
        .map_err(|rejection| ValidationError::Malformed(rejection.body_text()))
        .and_then(|Json(input)| input.into_measurement(Utc::now()))
        .inspect_err(|e| {
            metrics::record_measurement_rejected();
            tracing::warn!(error = %e, "Rejected measurement");
        })?;

    let alerts = state.pipeline.on_measurement(measurement.clone()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MeasurementResponse { measurement, alerts })),
    )
        .into_response())
}

// ============================================================================
// Alert Query Handlers
// ============================================================================

/// Most recent alerts, newest first
async fn recent_alerts(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.pipeline.history().recent().await))
}

/// Alerts for one location, newest first
async fn alerts_by_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> impl IntoResponse {
    Json(ApiResponse::success(
        state.pipeline.history().by_location(&location_id).await,
    ))
}

/// Alerts of one type, newest first
async fn alerts_by_type(
    State(state): State<AppState>,
    Path(alert_type): Path<String>,
) -> Result<Json<ApiResponse<Vec<Alert>>>, Error> {
    let alert_type = alert_type.parse::<AlertType>()?;
    Ok(Json(ApiResponse::success(
        state.pipeline.history().by_type(alert_type).await,
    )))
}

// ============================================================================
// Tests
// ============================================================================
