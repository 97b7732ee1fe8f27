//! # Shared Dashboard State
//!
//! The single mutable aggregate owned by an ingestion session. Both pollers
//! mutate it through short exclusive critical sections; the state reader
//! clones a consistent [`DashboardSnapshot`] out under a read lock. The lock
//! is never held across network I/O.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Notify;

use crate::constants::{
    CHART_MAX_STEP, CHART_START_VALUE, CHART_VALUE_MAX, CHART_VALUE_MIN, MAX_CHART_POINTS,
    MAX_EVENT_LOGS,
};
use crate::model::{ChartPoint, Event, QueueDepths, QueueRow, Stats};
use crate::queues::QueueEnv;

/// Read-only projection published to the rendering layer.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Newest-first, at most [`MAX_EVENT_LOGS`].
    pub events: Vec<Event>,
    /// Ascending by time step, at most [`MAX_CHART_POINTS`].
    pub chart_series: Vec<ChartPoint>,
    pub stats: Stats,
    pub queue_rows: Vec<QueueRow>,
    pub dlq_queue_rows: Vec<QueueRow>,
    pub is_streaming: bool,
    pub use_dev_queues: bool,
}

/// Mutable aggregates for one session. All mutation happens under the
/// [`SharedState`] write lock so readers never observe a partial batch.
#[derive(Debug)]
pub struct DashboardState {
    events: VecDeque<Event>,
    chart_series: VecDeque<ChartPoint>,
    stats: Stats,
    time_step: u64,
    last_chart_value: i64,
    /// Keyed by queue name across both environments; merge-on-write, a
    /// failed fetch never blanks a last-known value.
    queue_attributes: HashMap<String, QueueDepths>,
    use_dev_queues: bool,
}

impl DashboardState {
    fn new(use_dev_queues: bool) -> Self {
        Self {
            events: VecDeque::new(),
            chart_series: VecDeque::new(),
            stats: Stats::default(),
            time_step: 0,
            last_chart_value: CHART_START_VALUE,
            queue_attributes: HashMap::new(),
            use_dev_queues,
        }
    }

    /// Prepend a batch in receipt order (the newest message ends up first)
    /// and evict from the tail beyond capacity.
    pub fn append_events(&mut self, batch: Vec<Event>) {
        for event in batch {
            self.events.push_front(event);
        }
        self.events.truncate(MAX_EVENT_LOGS);
    }

    /// Append a batch and evict from the head beyond capacity.
    pub fn append_points(&mut self, batch: Vec<ChartPoint>) {
        for point in batch {
            self.chart_series.push_back(point);
        }
        while self.chart_series.len() > MAX_CHART_POINTS {
            self.chart_series.pop_front();
        }
    }

    /// Bump the running counters by the batch's per-status counts.
    pub fn increment_stats(&mut self, batch: &[Event]) {
        for event in batch {
            self.stats.record(event.status);
        }
    }

    /// Generate `count` random-walk chart samples, advancing the monotonic
    /// time step.
    pub fn next_chart_points(&mut self, count: usize) -> Vec<ChartPoint> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| {
                self.time_step += 1;
                let change = rng.gen_range(-CHART_MAX_STEP..=CHART_MAX_STEP);
                self.last_chart_value =
                    (self.last_chart_value + change).clamp(CHART_VALUE_MIN, CHART_VALUE_MAX);
                ChartPoint {
                    time: self.time_step,
                    value: self.last_chart_value,
                }
            })
            .collect()
    }

    /// Apply one received batch as an atomic unit: chart points, counters,
    /// and the event log all move together.
    pub fn apply_batch(&mut self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        let points = self.next_chart_points(events.len());
        self.increment_stats(&events);
        self.append_events(events);
        self.append_points(points);
    }

    /// Clear the rolling aggregates for a stream (re)start. Queue depth
    /// snapshots survive: they are keyed by name across both environments
    /// and deliberately persist through restarts and toggles.
    pub fn reset_aggregates(&mut self) {
        self.events.clear();
        self.chart_series.clear();
        self.stats = Stats::default();
        self.time_step = 0;
        self.last_chart_value = CHART_START_VALUE;
    }

    /// Merge one depth-poll cycle into the snapshot map. Keys absent from
    /// `partial` (failed or skipped fetches) keep their previous values.
    pub fn merge_queue_depths(&mut self, partial: HashMap<String, QueueDepths>) {
        self.queue_attributes.extend(partial);
    }

    pub fn use_dev_queues(&self) -> bool {
        self.use_dev_queues
    }

    pub fn set_use_dev_queues(&mut self, use_dev_queues: bool) {
        self.use_dev_queues = use_dev_queues;
    }

    /// True when the named queue already has a recorded depth value.
    pub fn has_queue_depths(&self, name: &str) -> bool {
        self.queue_attributes.contains_key(name)
    }

    /// Resolve rows for the given names against the active environment,
    /// falling back to the opposite environment's last-known value, then to
    /// an all-zero row.
    pub fn queue_rows(&self, names: &[String]) -> Vec<QueueRow> {
        let env = QueueEnv::from_dev_flag(self.use_dev_queues);
        names
            .iter()
            .map(|name| {
                let depths = self
                    .queue_attributes
                    .get(name)
                    .or_else(|| self.queue_attributes.get(&env.counterpart(name)))
                    .cloned()
                    .unwrap_or_else(QueueDepths::zero);
                QueueRow {
                    name: name.clone(),
                    depths,
                }
            })
            .collect()
    }

    fn snapshot(&self, is_streaming: bool) -> DashboardSnapshot {
        let env = QueueEnv::from_dev_flag(self.use_dev_queues);
        DashboardSnapshot {
            events: self.events.iter().cloned().collect(),
            chart_series: self.chart_series.iter().copied().collect(),
            stats: self.stats,
            queue_rows: self.queue_rows(&env.main_queues()),
            dlq_queue_rows: self.queue_rows(&env.dlq_queues()),
            is_streaming,
            use_dev_queues: self.use_dev_queues,
        }
    }
}

/// State shared between the session, its pollers, and the state reader.
///
/// The streaming flag is observed cooperatively at every loop-top; the
/// [`Notify`] doubles as the cancellation signal so an explicit stop never
/// waits out an in-flight long-poll.
#[derive(Debug)]
pub struct SharedState {
    inner: RwLock<DashboardState>,
    streaming: AtomicBool,
    stop_notify: Notify,
}

impl SharedState {
    pub fn new(use_dev_queues: bool) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(DashboardState::new(use_dev_queues)),
            streaming: AtomicBool::new(false),
            stop_notify: Notify::new(),
        })
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    pub(crate) fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::Release);
    }

    /// Signal both pollers to wind down.
    pub(crate) fn request_stop(&self) {
        self.streaming.store(false, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Resolves when a stop is requested. Raced against blocking I/O inside
    /// the poll loops.
    ///
    /// Registers as a waiter before re-reading the flag, so a
    /// `request_stop` landing between a caller's flag check and this await
    /// cannot be missed: either the flag read observes the store, or the
    /// registered waiter receives the notification.
    pub(crate) async fn stop_requested(&self) {
        let notified = self.stop_notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if !self.is_streaming() {
            return;
        }
        notified.await;
    }

    /// Run `f` inside the exclusive critical section.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Run `f` under the shared read lock.
    pub(crate) fn read_state<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Clone a consistent snapshot out under the read lock.
    pub fn snapshot(&self) -> DashboardSnapshot {
        let guard = self.inner.read();
        guard.snapshot(self.is_streaming())
    }
}
