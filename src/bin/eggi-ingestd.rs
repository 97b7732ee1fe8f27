//! Ingestion Daemon Binary
//!
//! Standalone binary running one ingestion session against AWS SQS. Set
//! `EGGI_SIMULATE=true` to run against an in-memory queue fed with synthetic
//! events instead, which exercises the full aggregate pipeline with no AWS
//! credentials.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::info;

use eggi_ingest::ingest::IngestSession;
use eggi_ingest::logging::init_structured_logging;
use eggi_ingest::messaging::{QueueClient, SqsQueueClient};
use eggi_ingest::queues::QueueEnv;
use eggi_ingest::synthetic::synthetic_event;
use eggi_ingest::test_helpers::{depth_attributes, InMemoryQueueClient};
use eggi_ingest::IngestConfig;

const STATS_LOG_INTERVAL: Duration = Duration::from_secs(10);
const SIMULATE_EVENT_INTERVAL: Duration = Duration::from_millis(1500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config = IngestConfig::from_env()?;
    config.validate()?;

    let simulate = std::env::var("EGGI_SIMULATE")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let client: Arc<dyn QueueClient> = if simulate {
        info!("🔧 Simulate mode: using in-memory queues");
        Arc::new(simulated_queue_service(&config))
    } else {
        Arc::new(SqsQueueClient::connect().await)
    };

    let session = IngestSession::new(client, config);
    info!(session_id = %session.session_id(), "🚀 Starting eggi ingestion daemon");
    session.start().await;

    if simulate {
        let feeder = Arc::clone(&session);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SIMULATE_EVENT_INTERVAL);
            while feeder.is_streaming() {
                ticker.tick().await;
                let event = synthetic_event(&mut rand::thread_rng());
                feeder.publish_events(vec![event]);
            }
        });
    }

    let mut stats_ticker = tokio::time::interval(STATS_LOG_INTERVAL);
    stats_ticker.tick().await; // first tick fires immediately
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = stats_ticker.tick() => {
                let snapshot = session.snapshot();
                info!(
                    total = snapshot.stats.total,
                    ok = snapshot.stats.ok,
                    warn = snapshot.stats.warn,
                    error = snapshot.stats.error,
                    events = snapshot.events.len(),
                    streaming = snapshot.is_streaming,
                    "📥 Ingestion stats"
                );
            }
        }
    }

    session.shutdown().await;
    info!("✅ Ingestion daemon stopped");

    Ok(())
}

/// In-memory queue fleet mirroring the active environment, with fixed depth
/// attributes so the depth poller has something to sample.
fn simulated_queue_service(config: &IngestConfig) -> InMemoryQueueClient {
    let client = InMemoryQueueClient::new();
    let env = QueueEnv::from_dev_flag(config.use_dev_queues);
    for name in env.all_queues() {
        client.register_queue(&name);
        client.set_attributes(&name, depth_attributes("0", "0", "0"));
    }
    client.register_queue(&env.event_queue(&config.event_queue));
    client
}
