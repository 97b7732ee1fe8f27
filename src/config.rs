//! # Ingestion Configuration
//!
//! Explicit, validated configuration for the ingestion core. Defaults cover
//! local development; production overrides arrive through `EGGI__*`
//! environment variables (e.g. `EGGI__EVENT_QUEUE`,
//! `EGGI__USE_DEV_QUEUES=true`). AWS credentials and region are read
//! separately by the SQS client from the standard AWS environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEPTH_POLL_INTERVAL, POLL_ERROR_BACKOFF, RECEIVE_MAX_MESSAGES, RECEIVE_WAIT_SECONDS,
};
use crate::error::{IngestError, Result};
use crate::queues::DEFAULT_EVENT_QUEUE;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "EGGI";

/// Runtime configuration for an ingestion session.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Production name of the event-stream queue; the dev variant is
    /// derived by the uniform prefix substitution.
    pub event_queue: String,

    /// Messages requested per receive call (SQS allows 1..=10).
    pub receive_max_messages: i32,

    /// Long-poll wait per receive call in seconds (SQS allows 0..=20).
    pub receive_wait_seconds: i32,

    /// Sleep between retries after an adapter fault, in seconds.
    pub error_backoff_seconds: u64,

    /// Queue-depth sampling cadence, in milliseconds.
    pub depth_poll_interval_ms: u64,

    /// Start sessions against the dev queue namespace.
    pub use_dev_queues: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            event_queue: DEFAULT_EVENT_QUEUE.to_string(),
            receive_max_messages: RECEIVE_MAX_MESSAGES,
            receive_wait_seconds: RECEIVE_WAIT_SECONDS,
            error_backoff_seconds: POLL_ERROR_BACKOFF.as_secs(),
            depth_poll_interval_ms: DEPTH_POLL_INTERVAL.as_millis() as u64,
            use_dev_queues: false,
        }
    }
}

impl IngestConfig {
    /// Load configuration from defaults layered with `EGGI__*` environment
    /// variables, then validate.
    pub fn from_env() -> Result<Self> {
        let loaded: Self = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the queue service would refuse at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.event_queue.is_empty() {
            return Err(IngestError::config("event_queue must not be empty"));
        }
        if !(1..=10).contains(&self.receive_max_messages) {
            return Err(IngestError::config(format!(
                "receive_max_messages must be 1..=10, got {}",
                self.receive_max_messages
            )));
        }
        if !(0..=20).contains(&self.receive_wait_seconds) {
            return Err(IngestError::config(format!(
                "receive_wait_seconds must be 0..=20, got {}",
                self.receive_wait_seconds
            )));
        }
        if self.depth_poll_interval_ms == 0 {
            return Err(IngestError::config(
                "depth_poll_interval_ms must be positive",
            ));
        }
        Ok(())
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_seconds)
    }

    pub fn depth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.depth_poll_interval_ms)
    }
}
