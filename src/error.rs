//! Structured error handling for the ingestion core.
//!
//! Failures at the queue boundary carry their own taxonomy
//! ([`crate::messaging::QueueError`]) because the pollers react to the
//! variants differently: `NotFound` retains stale state, `Transient` enters
//! backoff. Everything else funnels into [`IngestError`].

use thiserror::Error;

use crate::messaging::QueueError;

/// Result type for ingestion-core operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors surfaced by the ingestion core.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Invalid or unloadable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Fault at the queue service boundary.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Session lifecycle misuse (e.g. starting a running session's poller twice).
    #[error("session error: {0}")]
    Session(String),
}

impl IngestError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    pub fn session<S: Into<String>>(message: S) -> Self {
        Self::Session(message.into())
    }
}

impl From<config::ConfigError> for IngestError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
