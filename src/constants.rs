//! # System Constants
//!
//! Operational boundaries of the ingestion core: aggregate capacities,
//! polling cadences, chart random-walk bounds, and display sentinels.

use std::time::Duration;

/// Maximum number of events retained in the rolling event log.
pub const MAX_EVENT_LOGS: usize = 100;

/// Maximum number of points retained in the chart series.
pub const MAX_CHART_POINTS: usize = 60;

/// Maximum messages requested per receive call (SQS caps this at 10).
pub const RECEIVE_MAX_MESSAGES: i32 = 10;

/// Server-side long-poll wait per receive call (SQS caps this at 20s).
pub const RECEIVE_WAIT_SECONDS: i32 = 20;

/// Fixed sleep between retries after an adapter fault.
pub const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Cadence of the queue-depth sampling loop.
pub const DEPTH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Chart random walk: starting value for an empty series.
pub const CHART_START_VALUE: i64 = 150;

/// Chart random walk: maximum absolute change per step.
pub const CHART_MAX_STEP: i64 = 15;

/// Chart random walk: inclusive value floor.
pub const CHART_VALUE_MIN: i64 = 20;

/// Chart random walk: inclusive value ceiling.
pub const CHART_VALUE_MAX: i64 = 300;

/// Service name attributed to events whose payload omits `event_source`.
pub const UNKNOWN_SERVICE: &str = "unknown-service";

/// Fixed avatar hint attached to adapter-derived events.
pub const EVENT_AVATAR: &str = "egg-fried";

/// Placeholder for identifiers absent from a payload.
pub const MISSING_FIELD: &str = "N/A";

/// Depth sentinel: attribute missing from an otherwise successful fetch.
pub const DEPTH_UNAVAILABLE: &str = "N/A";

/// Depth sentinel: fetch failed and no prior value exists for the queue.
pub const DEPTH_ERROR: &str = "ERR";

/// Depth shown for queues with no data in either environment.
pub const DEPTH_ZERO: &str = "0";

/// SQS attribute names sampled by the depth poller.
pub mod attributes {
    pub const VISIBLE: &str = "ApproximateNumberOfMessages";
    pub const IN_FLIGHT: &str = "ApproximateNumberOfMessagesNotVisible";
    pub const DELAYED: &str = "ApproximateNumberOfMessagesDelayed";
}
