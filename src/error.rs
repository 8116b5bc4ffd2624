//! Unified error handling for the stormwatch crate
//!
//! Each subsystem raises its own error enum. [`Error`] wraps them so callers
//! at the edges (HTTP handlers, the poller, the metrics endpoint) can decide
//! what to do from a single [`ErrorCategory`].
//!
//! ```rust,ignore
//! use stormwatch::error::{Error, StormwatchErrorTrait};
//!
//! fn report(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "transient failure: {err}");
//!     } else {
//!         tracing::error!(category = %err.category(), "{err}");
//!     }
//! }
//! ```

use std::fmt;
use thiserror::Error;

pub use crate::bus::PublishError;
pub use crate::ingest::IngestError;
pub use crate::models::ValidationError;
pub use crate::notifications::ChannelError;
pub use crate::server::ServerError;

/// Common trait for all stormwatch error types
pub trait StormwatchErrorTrait: std::error::Error {
    /// Whether retrying the same operation may succeed
    fn is_recoverable(&self) -> bool;

    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed measurements or alert fields
    Validation,
    /// Upstream or socket failures
    Network,
    /// Notification delivery and alert bus errors
    Notification,
    /// Missing or invalid settings
    Config,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Notification => "notification",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the stormwatch crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Metric registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StormwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Channel(e) => matches!(e, ChannelError::HttpError(_) | ChannelError::Unavailable(_)),
            Self::Publish(_) => false,
            Self::Ingest(e) => e.is_recoverable(),
            Self::Server(e) => matches!(e, ServerError::BindError(_)),
            Self::Metrics(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Channel(_) | Self::Publish(_) => ErrorCategory::Notification,
            Self::Ingest(e) => match e {
                IngestError::Invalid(_) => ErrorCategory::Validation,
                IngestError::MissingApiKey => ErrorCategory::Config,
                _ => ErrorCategory::Network,
            },
            Self::Server(e) => match e {
                ServerError::ConfigError(_) => ErrorCategory::Config,
                _ => ErrorCategory::Network,
            },
            Self::Metrics(_) | Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
