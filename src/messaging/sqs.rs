//! # AWS SQS Queue Client
//!
//! [`QueueClient`] implementation over the AWS SQS SDK. Credentials and
//! region come from the process environment via `aws-config`.

use std::collections::HashMap;

use aws_config::BehaviorVersion;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, QueueAttributeName};
use tracing::{debug, info, warn};

use super::{DeleteEntry, QueueClient, QueueError, RawMessage};

/// SQS delete-message-batch accepts at most 10 entries per call.
const DELETE_BATCH_CHUNK: usize = 10;

/// SQS-backed message queue client.
#[derive(Debug, Clone)]
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
}

impl SqsQueueClient {
    /// Connect using credentials/region from the process environment.
    pub async fn connect() -> Self {
        info!("🚀 Connecting to SQS using environment configuration");

        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = aws_sdk_sqs::Client::new(&sdk_config);

        info!("✅ SQS client ready");
        Self { client }
    }

    /// Wrap an existing SDK client (used when the caller owns configuration).
    pub fn from_client(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<Vec<RawMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_seconds)
            .send()
            .await
            .map_err(|e| QueueError::transient(e.to_string()))?;

        let messages: Vec<RawMessage> = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| {
                let message_id = msg.message_id().unwrap_or_default().to_string();
                let Some(receipt_handle) = msg.receipt_handle() else {
                    warn!(queue_url = %queue_url, message_id = %message_id,
                        "Received message without receipt handle, skipping");
                    return None;
                };
                Some(RawMessage {
                    message_id,
                    receipt_handle: receipt_handle.to_string(),
                    body: msg.body().unwrap_or_default().to_string(),
                })
            })
            .collect();

        debug!(
            queue_url = %queue_url,
            count = messages.len(),
            "📥 Received messages from queue"
        );
        Ok(messages)
    }

    async fn delete_batch(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<(), QueueError> {
        if entries.is_empty() {
            return Ok(());
        }

        for chunk in entries.chunks(DELETE_BATCH_CHUNK) {
            let mut batch = Vec::with_capacity(chunk.len());
            for entry in chunk {
                match DeleteMessageBatchRequestEntry::builder()
                    .id(&entry.id)
                    .receipt_handle(&entry.receipt_handle)
                    .build()
                {
                    Ok(built) => batch.push(built),
                    Err(e) => {
                        warn!(queue_url = %queue_url, id = %entry.id, error = %e,
                            "Skipping malformed delete entry");
                    }
                }
            }

            match self
                .client
                .delete_message_batch()
                .queue_url(queue_url)
                .set_entries(Some(batch))
                .send()
                .await
            {
                Ok(output) => {
                    for failed in output.failed() {
                        warn!(
                            queue_url = %queue_url,
                            id = %failed.id(),
                            code = %failed.code(),
                            "Batch delete entry failed (message will be redelivered)"
                        );
                    }
                }
                Err(e) => {
                    // Best-effort contract: log and move on, the messages
                    // return after their visibility timeout expires.
                    warn!(
                        queue_url = %queue_url,
                        batch_size = chunk.len(),
                        error = %e,
                        "Batch delete call failed (messages will be redelivered)"
                    );
                }
            }
        }

        Ok(())
    }

    async fn get_queue_url(&self, name: &str) -> Result<String, QueueError> {
        match self.client.get_queue_url().queue_name(name).send().await {
            Ok(output) => output
                .queue_url()
                .map(str::to_owned)
                .ok_or_else(|| QueueError::not_found(name)),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|svc| svc.is_queue_does_not_exist())
                {
                    Err(QueueError::not_found(name))
                } else {
                    Err(QueueError::transient(e.to_string()))
                }
            }
        }
    }

    async fn get_attributes(
        &self,
        queue_url: &str,
    ) -> Result<HashMap<String, String>, QueueError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::All)
            .send()
            .await
            .map_err(|e| QueueError::transient(e.to_string()))?;

        Ok(output
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect())
    }
}
