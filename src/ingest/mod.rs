//! # Ingestion Session
//!
//! The control surface over the ingestion core. A session owns the shared
//! dashboard state and the two background pollers (event stream and queue
//! depth); commands start, stop, and re-target them between the prod and dev
//! queue namespaces. The state reader consumes
//! [`IngestSession::snapshot`]; no error ever propagates past this surface,
//! the only externally visible failure mode is the streaming flag going
//! false.

pub(crate) mod depth_poller;
pub(crate) mod stream_poller;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::messaging::QueueClient;
use crate::model::Event;
use crate::queues::QueueEnv;
use crate::state::{DashboardSnapshot, SharedState};

use depth_poller::{run_depth_poller, DepthPollerContext};
use stream_poller::{run_event_stream, StreamPollerContext};

/// One live ingestion session: shared state plus the pollers feeding it.
#[derive(Debug)]
pub struct IngestSession {
    client: Arc<dyn QueueClient>,
    config: IngestConfig,
    state: Arc<SharedState>,
    session_id: Uuid,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl IngestSession {
    /// Create a session against the given queue client. Nothing runs until
    /// [`start`](Self::start) is called.
    pub fn new(client: Arc<dyn QueueClient>, config: IngestConfig) -> Arc<Self> {
        let state = SharedState::new(config.use_dev_queues);
        Arc::new(Self {
            client,
            config,
            state,
            session_id: Uuid::new_v4(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The state-reader interface: a consistent snapshot of published state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.snapshot()
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_streaming()
    }

    /// Reset the rolling aggregates and launch both pollers. No-op when the
    /// session is already streaming.
    pub async fn start(&self) {
        if self.state.is_streaming() {
            warn!(session_id = %self.session_id, "start() ignored, session already streaming");
            return;
        }

        let env = self
            .state
            .read_state(|state| QueueEnv::from_dev_flag(state.use_dev_queues()));
        self.state.with_state(|state| state.reset_aggregates());
        self.state.set_streaming(true);

        info!(session_id = %self.session_id, env = ?env, "▶️ Starting ingestion session");

        let stream_handle = tokio::spawn(run_event_stream(StreamPollerContext {
            client: Arc::clone(&self.client),
            state: Arc::clone(&self.state),
            queue_name: env.event_queue(&self.config.event_queue),
            config: self.config.clone(),
            session_id: self.session_id,
        }));
        let depth_handle = tokio::spawn(run_depth_poller(DepthPollerContext {
            client: Arc::clone(&self.client),
            state: Arc::clone(&self.state),
            env,
            config: self.config.clone(),
            session_id: self.session_id,
        }));

        let mut tasks = self.tasks.lock();
        tasks.push(stream_handle);
        tasks.push(depth_handle);
    }

    /// Signal both pollers to wind down and wait for them to exit. The stop
    /// request doubles as the cancellation signal, so an in-flight long-poll
    /// is abandoned rather than waited out.
    pub async fn stop(&self) {
        self.state.request_stop();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(session_id = %self.session_id, error = %e, "Poller task join failed");
            }
        }

        info!(session_id = %self.session_id, "⏹️ Ingestion session stopped");
    }

    /// Flip between the prod and dev queue namespaces. While streaming this
    /// restarts both pollers against the new name set (resetting the rolling
    /// aggregates as a side effect); depth snapshots for both environments'
    /// keys persist across the toggle.
    pub async fn set_use_dev_queues(&self, use_dev_queues: bool) {
        let was_streaming = self.state.is_streaming();
        if was_streaming {
            self.stop().await;
        }

        self.state
            .with_state(|state| state.set_use_dev_queues(use_dev_queues));
        info!(
            session_id = %self.session_id,
            use_dev_queues = use_dev_queues,
            "Queue environment toggled"
        );

        if was_streaming {
            self.start().await;
        }
    }

    /// Feed externally generated events through the same atomic batch path
    /// the stream poller uses. Drives simulate mode and tests.
    pub fn publish_events(&self, batch: Vec<Event>) {
        self.state.with_state(|state| state.apply_batch(batch));
    }

    /// Session teardown: stop streaming and release the queue client.
    pub async fn shutdown(&self) {
        self.stop().await;
    }
}
