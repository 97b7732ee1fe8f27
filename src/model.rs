//! # Dashboard Data Model
//!
//! Typed records flowing from the queue boundary into the published state:
//! normalized events, chart samples, running counters, and per-queue depth
//! snapshots. All types are cheap to clone; snapshots are cloned out of the
//! shared state under a read lock.

use serde::{Deserialize, Serialize};

use crate::constants::DEPTH_ZERO;

/// Severity classification of a normalized event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Ok,
    Warn,
    Error,
}

/// A single normalized telemetry event, immutable once constructed.
///
/// Lives at the head of a bounded newest-first log; evicted from the tail
/// when the log exceeds [`crate::constants::MAX_EVENT_LOGS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Wall-clock display time, `HH:MM:SS` UTC.
    pub timestamp: String,
    /// Origin identifier, derived from the payload's `event_source`.
    pub service: String,
    pub status: EventStatus,
    pub message: String,
    /// Opaque display hint for the rendering layer.
    pub avatar: String,
}

/// One sample in the bounded chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Monotonic step counter, never reused within a stream run.
    pub time: u64,
    /// Clamped to the random-walk range.
    pub value: i64,
}

/// Running counters for the current stream run.
///
/// Monotonically increasing between stream (re)starts. Invariant after
/// every update: `total == ok + warn + error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub ok: u64,
    pub warn: u64,
    pub error: u64,
}

impl Stats {
    /// Record a single event's status.
    pub fn record(&mut self, status: EventStatus) {
        self.total += 1;
        match status {
            EventStatus::Ok => self.ok += 1,
            EventStatus::Warn => self.warn += 1,
            EventStatus::Error => self.error += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.ok + self.warn + self.error
    }
}

/// Approximate depth counters for one queue.
///
/// Values are string-encoded integers, or the sentinels `"N/A"` (attribute
/// missing from a successful fetch) and `"ERR"` (fetch failed before any
/// value was recorded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepths {
    pub visible: String,
    pub in_flight: String,
    pub delayed: String,
}

impl QueueDepths {
    pub fn new(
        visible: impl Into<String>,
        in_flight: impl Into<String>,
        delayed: impl Into<String>,
    ) -> Self {
        Self {
            visible: visible.into(),
            in_flight: in_flight.into(),
            delayed: delayed.into(),
        }
    }

    /// Row shown for queues with no data in either environment.
    pub fn zero() -> Self {
        Self::new(DEPTH_ZERO, DEPTH_ZERO, DEPTH_ZERO)
    }
}

/// Published projection of one queue for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRow {
    pub name: String,
    pub depths: QueueDepths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_record_keeps_total_consistent() {
        let mut stats = Stats::default();
        stats.record(EventStatus::Ok);
        stats.record(EventStatus::Ok);
        stats.record(EventStatus::Warn);
        stats.record(EventStatus::Error);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.ok, 2);
        assert_eq!(stats.warn, 1);
        assert_eq!(stats.error, 1);
        assert!(stats.is_consistent());
    }

    #[test]
    fn event_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Ok).unwrap(),
            r#""OK""#
        );
        assert_eq!(
            serde_json::to_string(&EventStatus::Error).unwrap(),
            r#""ERROR""#
        );
    }

    #[test]
    fn zero_depths_are_all_zero_strings() {
        let depths = QueueDepths::zero();
        assert_eq!(depths.visible, "0");
        assert_eq!(depths.in_flight, "0");
        assert_eq!(depths.delayed, "0");
    }
}
