//! # Test Helpers
//!
//! An in-memory [`QueueClient`] so session and poller behavior can be tested
//! without a queue service. Messages are handed out once per receive, delete
//! requests are recorded rather than enforced, and attribute fetches support
//! scripted failures.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::messaging::{DeleteEntry, QueueClient, QueueError, RawMessage};

const URL_SCHEME: &str = "mem://";

/// Pacing sleep for an empty receive, standing in for the long-poll wait so
/// an idle poller does not spin.
const EMPTY_RECEIVE_PAUSE: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Inner {
    queues: HashMap<String, VecDeque<RawMessage>>,
    attributes: HashMap<String, HashMap<String, String>>,
    attribute_failures: HashMap<String, u32>,
    deleted: Vec<DeleteEntry>,
    next_id: u64,
}

/// In-memory queue service double.
#[derive(Default)]
pub struct InMemoryQueueClient {
    inner: Mutex<Inner>,
}

impl fmt::Debug for InMemoryQueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryQueueClient").finish_non_exhaustive()
    }
}

impl InMemoryQueueClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queue so URL resolution succeeds for it.
    pub fn register_queue(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.queues.entry(name.to_string()).or_default();
    }

    /// Enqueue a raw body on a queue, registering it as a side effect.
    /// Returns the assigned message id.
    pub fn push_message(&self, name: &str, body: &str) -> String {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let message_id = format!("msg-{}", inner.next_id);
        let message = RawMessage {
            message_id: message_id.clone(),
            receipt_handle: format!("rh-{}", inner.next_id),
            body: body.to_string(),
        };
        inner
            .queues
            .entry(name.to_string())
            .or_default()
            .push_back(message);
        message_id
    }

    /// Set the depth attributes reported for a queue.
    pub fn set_attributes(&self, name: &str, attributes: HashMap<String, String>) {
        let mut inner = self.inner.lock();
        inner.queues.entry(name.to_string()).or_default();
        inner.attributes.insert(name.to_string(), attributes);
    }

    /// Make the next `count` attribute fetches for a queue fail.
    pub fn fail_attributes(&self, name: &str, count: u32) {
        self.inner
            .lock()
            .attribute_failures
            .insert(name.to_string(), count);
    }

    /// Message ids that have been delete-batched so far.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .deleted
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Messages still waiting on a queue.
    pub fn remaining(&self, name: &str) -> usize {
        self.inner
            .lock()
            .queues
            .get(name)
            .map_or(0, VecDeque::len)
    }

    fn name_from_url(url: &str) -> &str {
        url.strip_prefix(URL_SCHEME).unwrap_or(url)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        _wait_seconds: i32,
    ) -> Result<Vec<RawMessage>, QueueError> {
        let name = Self::name_from_url(queue_url).to_string();
        let page = {
            let mut inner = self.inner.lock();
            let queue = inner
                .queues
                .get_mut(&name)
                .ok_or_else(|| QueueError::not_found(name.clone()))?;
            let take = usize::try_from(max_messages.max(0)).unwrap_or(0);
            let mut page = Vec::with_capacity(take.min(queue.len()));
            while page.len() < take {
                match queue.pop_front() {
                    Some(message) => page.push(message),
                    None => break,
                }
            }
            page
        };

        if page.is_empty() {
            tokio::time::sleep(EMPTY_RECEIVE_PAUSE).await;
        }
        Ok(page)
    }

    async fn delete_batch(
        &self,
        _queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<(), QueueError> {
        self.inner.lock().deleted.extend(entries);
        Ok(())
    }

    async fn get_queue_url(&self, name: &str) -> Result<String, QueueError> {
        let inner = self.inner.lock();
        if inner.queues.contains_key(name) {
            Ok(format!("{URL_SCHEME}{name}"))
        } else {
            Err(QueueError::not_found(name))
        }
    }

    async fn get_attributes(
        &self,
        queue_url: &str,
    ) -> Result<HashMap<String, String>, QueueError> {
        let name = Self::name_from_url(queue_url).to_string();
        let mut inner = self.inner.lock();

        if let Some(remaining) = inner.attribute_failures.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(QueueError::transient(format!(
                    "scripted attribute failure for {name}"
                )));
            }
        }

        Ok(inner.attributes.get(&name).cloned().unwrap_or_default())
    }
}

/// Depth attribute map with the three published counters set.
pub fn depth_attributes(visible: &str, in_flight: &str, delayed: &str) -> HashMap<String, String> {
    use crate::constants::attributes;
    HashMap::from([
        (attributes::VISIBLE.to_string(), visible.to_string()),
        (attributes::IN_FLIGHT.to_string(), in_flight.to_string()),
        (attributes::DELAYED.to_string(), delayed.to_string()),
    ])
}
