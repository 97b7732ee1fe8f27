#![allow(clippy::doc_markdown)] // Allow technical terms like SQS, DLQ in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Eggi Ingest
//!
//! Live-telemetry ingestion core for the eggi dashboard: long-polls the
//! event-stream queue, normalizes raw queue messages into typed events,
//! maintains bounded in-memory aggregates, and samples approximate depth
//! counters for the full prod/dev queue fleet.
//!
//! ## Architecture
//!
//! An [`IngestSession`](ingest::IngestSession) owns the shared dashboard
//! state and two background pollers:
//!
//! - the **event-stream poller** long-polls the event queue, normalizes each
//!   message, applies the batch atomically, and batch-deletes only the
//!   messages it fully consumed (at-least-once semantics; malformed messages
//!   stay queued for the redrive policy);
//! - the **depth poller** samples the three approximate depth counters for
//!   every queue in the active environment on a fixed cadence, merging each
//!   cycle into the previous snapshot so a failed fetch never blanks a
//!   last-known value.
//!
//! Readers pull a consistent [`DashboardSnapshot`](state::DashboardSnapshot)
//! at their own cadence; the pollers never push.
//!
//! ## Module Organization
//!
//! - [`ingest`] - Session lifecycle and the two poll loops
//! - [`state`] - Bounded aggregates and the published snapshot
//! - [`normalizer`] - Raw queue message to typed event translation
//! - [`messaging`] - Queue service capability interface and the SQS adapter
//! - [`queues`] - Prod/dev queue fleet names and environment templating
//! - [`model`] - Published data types
//! - [`synthetic`] - Weighted random events for simulate mode
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eggi_ingest::{IngestConfig, IngestSession, SqsQueueClient};
//!
//! # async fn example() -> eggi_ingest::Result<()> {
//! let config = IngestConfig::from_env()?;
//! let client = Arc::new(SqsQueueClient::connect().await);
//!
//! let session = IngestSession::new(client, config);
//! session.start().await;
//!
//! let snapshot = session.snapshot();
//! println!("{} events, streaming: {}", snapshot.events.len(), snapshot.is_streaming);
//!
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod normalizer;
pub mod queues;
pub mod state;
pub mod synthetic;
pub mod test_helpers;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use ingest::IngestSession;
pub use messaging::{QueueClient, QueueError, RawMessage, SqsQueueClient};
pub use model::{ChartPoint, Event, EventStatus, QueueDepths, QueueRow, Stats};
pub use queues::QueueEnv;
pub use state::{DashboardSnapshot, SharedState};
