//! # Messaging Module
//!
//! Minimal capability interface over a message-queue service: long-poll
//! receive, best-effort batch delete, queue-URL resolution, and approximate
//! depth attributes. The production implementation ([`SqsQueueClient`])
//! wraps the AWS SQS SDK; tests substitute
//! [`crate::test_helpers::InMemoryQueueClient`].
//!
//! The adapter performs no retries. Retry and backoff policy lives in the
//! pollers that drive it.

pub mod sqs;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use sqs::SqsQueueClient;

/// A single raw message received from a queue.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Service-assigned message id.
    pub message_id: String,
    /// Receipt handle required to delete this delivery.
    pub receipt_handle: String,
    /// Raw payload body, expected (but not guaranteed) to be JSON.
    pub body: String,
}

/// One entry in a batch-delete request.
#[derive(Debug, Clone)]
pub struct DeleteEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl DeleteEntry {
    /// Delete entry for a message that was fully consumed.
    pub fn for_message(message: &RawMessage) -> Self {
        Self {
            id: message.message_id.clone(),
            receipt_handle: message.receipt_handle.clone(),
        }
    }
}

/// Errors at the queue service boundary.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The named queue has no URL.
    #[error("queue not found: {name}")]
    NotFound { name: String },

    /// Network or service fault; the operation may succeed if retried.
    #[error("transient queue service fault: {0}")]
    Transient(String),
}

impl QueueError {
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self::Transient(message.into())
    }
}

/// Capability interface over the queue service.
///
/// `receive` is the long-poll primitive: it blocks server-side up to
/// `wait_seconds` and an empty result is a normal timeout, not an error.
#[async_trait]
pub trait QueueClient: Send + Sync + fmt::Debug {
    /// Long-poll up to `max_messages` from the queue at `queue_url`.
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<Vec<RawMessage>, QueueError>;

    /// Best-effort batch delete. Per-entry failures are logged by the
    /// implementation and never retried; redelivery is an acceptable
    /// outcome under at-least-once semantics.
    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<(), QueueError>;

    /// Resolve a queue name to its URL.
    async fn get_queue_url(&self, name: &str) -> Result<String, QueueError>;

    /// Fetch the named depth counters for the queue at `queue_url`.
    async fn get_attributes(
        &self,
        queue_url: &str,
    ) -> Result<HashMap<String, String>, QueueError>;
}
