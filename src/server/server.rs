//! HTTP server
//!
//! Wraps the API router with optional CORS and request tracing and serves it
//! with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::analysis::AnalysisPipeline;
use crate::config::Config;

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Analysis pipeline (also owns the alert history)
    pub pipeline: Arc<AnalysisPipeline>,

    /// Server start time
    pub start_time: Instant,

    /// Whether the weather poller runs alongside the server
    pub ingest_enabled: bool,
}

impl AppState {
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self {
            pipeline,
            start_time: Instant::now(),
            ingest_enabled: false,
        }
    }
}

// ============================================================================
// Weather Server
// ============================================================================

/// HTTP server for measurement ingestion and alert queries
pub struct WeatherServer {
    bind_address: SocketAddr,
    enable_cors: bool,
    enable_request_logging: bool,
    state: AppState,
}

impl WeatherServer {
    /// Create a new server around an existing pipeline
    pub fn new(config: &Config, pipeline: Arc<AnalysisPipeline>) -> Result<Self, ServerError> {
        let bind_address = config
            .bind_addr()
            .map_err(|e| ServerError::ConfigError(format!("{e:#}")))?;

        let state = AppState {
            ingest_enabled: config.ingest.enabled,
            ..AppState::new(pipeline)
        };

        Ok(Self {
            bind_address,
            enable_cors: config.server.enable_cors,
            enable_request_logging: config.server.enable_request_logging,
            state,
        })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        // Add CORS layer if enabled
        if self.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if self.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.bind_address;

        tracing::info!("Starting weather server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Weather server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.bind_address,
            cors_enabled: self.enable_cors,
            request_logging_enabled: self.enable_request_logging,
            ingest_enabled: self.state.ingest_enabled,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
    pub ingest_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        let flag = |on: bool| if on { "enabled" } else { "disabled" };
        format!(
            "Stormwatch Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             CORS: {}\n\
             Request Logging: {}\n\
             Weather Polling: {}",
            "",
            self.bind_address,
            flag(self.cors_enabled),
            flag(self.request_logging_enabled),
            flag(self.ingest_enabled),
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    BindError(String),

    /// Server error
    #[error("Server error: {0}")]
    ServeError(String),
}

// ============================================================================
// Tests
// ============================================================================
