//! # Event-Stream Poll Loop
//!
//! Cancellable long-poll cycle over the event-stream queue: receive a page,
//! normalize each message, publish the batch atomically, then best-effort
//! delete the fully-consumed messages. Adapter faults enter a fixed backoff
//! and retry indefinitely; the loop terminates only on an observed stop
//! request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::messaging::{DeleteEntry, QueueClient, RawMessage};
use crate::model::Event;
use crate::normalizer::normalize;
use crate::state::SharedState;

/// Everything one event-stream poller run needs.
pub(crate) struct StreamPollerContext {
    pub client: Arc<dyn QueueClient>,
    pub state: Arc<SharedState>,
    /// Environment-resolved queue name.
    pub queue_name: String,
    pub config: IngestConfig,
    pub session_id: Uuid,
}

/// Run the event-stream poll loop to completion.
///
/// Every exit path clears the streaming flag so the depth poller and the
/// "Live" indicator wind down with it.
pub(crate) async fn run_event_stream(ctx: StreamPollerContext) {
    info!(
        session_id = %ctx.session_id,
        queue = %ctx.queue_name,
        "Starting event-stream poller"
    );

    poll_until_stopped(&ctx).await;

    // Finally-style cleanup on every exit path.
    ctx.state.set_streaming(false);
    info!(
        session_id = %ctx.session_id,
        queue = %ctx.queue_name,
        "Event-stream poller terminated"
    );
}

async fn poll_until_stopped(ctx: &StreamPollerContext) {
    let mut queue_url: Option<String> = None;

    loop {
        // Cooperative stop check at the top of every iteration.
        if !ctx.state.is_streaming() {
            break;
        }

        let url = match &queue_url {
            Some(url) => url.clone(),
            None => {
                let resolved = tokio::select! {
                    result = ctx.client.get_queue_url(&ctx.queue_name) => result,
                    _ = ctx.state.stop_requested() => break,
                };
                match resolved {
                    Ok(url) => {
                        debug!(queue = %ctx.queue_name, url = %url, "Resolved event queue URL");
                        queue_url = Some(url.clone());
                        url
                    }
                    Err(e) => {
                        // The queue may not exist yet; treat NotFound like a
                        // transient fault and keep trying.
                        warn!(queue = %ctx.queue_name, error = %e, "Could not resolve event queue URL");
                        if backoff(&ctx.state, ctx.config.error_backoff()).await.is_break() {
                            break;
                        }
                        continue;
                    }
                }
            }
        };

        let page = tokio::select! {
            result = ctx.client.receive(
                &url,
                ctx.config.receive_max_messages,
                ctx.config.receive_wait_seconds,
            ) => result,
            _ = ctx.state.stop_requested() => break,
        };

        match page {
            // Empty page is a long-poll timeout; the wait was the pacing.
            Ok(messages) if messages.is_empty() => continue,
            Ok(messages) => {
                let (events, deletes) = process_page(&messages);

                if !events.is_empty() {
                    // Single critical section: events, chart points, and
                    // counters move together.
                    ctx.state.with_state(|state| state.apply_batch(events));
                }

                if !deletes.is_empty() {
                    if let Err(e) = ctx.client.delete_batch(&url, deletes).await {
                        warn!(queue = %ctx.queue_name, error = %e,
                            "Batch delete failed (messages will be redelivered)");
                    }
                }
            }
            Err(e) => {
                error!(
                    queue = %ctx.queue_name,
                    error = %e,
                    backoff_secs = ctx.config.error_backoff_seconds,
                    "Receive failed, backing off"
                );
                if backoff(&ctx.state, ctx.config.error_backoff()).await.is_break() {
                    break;
                }
            }
        }
    }
}

/// Normalize a received page. Delete entries accumulate only for messages
/// that were fully consumed; a message that fails normalization is skipped
/// and left in the queue for its redrive policy.
fn process_page(messages: &[RawMessage]) -> (Vec<Event>, Vec<DeleteEntry>) {
    let now = Utc::now();
    let mut events = Vec::with_capacity(messages.len());
    let mut deletes = Vec::with_capacity(messages.len());

    for message in messages {
        match normalize(&message.body, now) {
            Some(event) => {
                events.push(event);
                deletes.push(DeleteEntry::for_message(message));
            }
            None => {
                warn!(
                    message_id = %message.message_id,
                    "Dropping unparseable message (left in queue for redrive)"
                );
            }
        }
    }

    (events, deletes)
}

/// Outcome of a backoff wait.
pub(crate) enum BackoffOutcome {
    Resumed,
    Stopped,
}

impl BackoffOutcome {
    pub(crate) fn is_break(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Sleep the fixed backoff interval, waking early on a stop request.
pub(crate) async fn backoff(state: &SharedState, wait: Duration) -> BackoffOutcome {
    tokio::select! {
        _ = tokio::time::sleep(wait) => BackoffOutcome::Resumed,
        _ = state.stop_requested() => BackoffOutcome::Stopped,
    }
}
