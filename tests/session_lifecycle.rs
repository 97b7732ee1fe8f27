//! Session lifecycle integration tests against the in-memory queue service:
//! start/stop semantics, at-least-once deletes, depth-snapshot retention, and
//! the prod/dev environment toggle.

use std::sync::Arc;
use std::time::Duration;

use eggi_ingest::constants::{DEPTH_ERROR, MAX_EVENT_LOGS};
use eggi_ingest::ingest::IngestSession;
use eggi_ingest::model::EventStatus;
use eggi_ingest::queues::{QueueEnv, DEFAULT_EVENT_QUEUE};
use eggi_ingest::test_helpers::{depth_attributes, InMemoryQueueClient};
use eggi_ingest::IngestConfig;

const MAPPING_QUEUE: &str = "eggi-mapping-service-profiles-to-analyse";

fn test_config() -> IngestConfig {
    IngestConfig {
        receive_wait_seconds: 0,
        error_backoff_seconds: 1,
        depth_poll_interval_ms: 10,
        ..IngestConfig::default()
    }
}

/// Client with the full prod fleet registered and zeroed, ready to stream.
fn prod_fleet() -> Arc<InMemoryQueueClient> {
    let client = Arc::new(InMemoryQueueClient::new());
    for name in QueueEnv::Prod.all_queues() {
        client.register_queue(&name);
        client.set_attributes(&name, depth_attributes("0", "0", "0"));
    }
    client.register_queue(DEFAULT_EVENT_QUEUE);
    client
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn valid_messages_are_ingested_and_deleted() {
    let client = prod_fleet();
    let valid_id = client.push_message(
        DEFAULT_EVENT_QUEUE,
        r#"{"event_source":"profile-analysis-completed","payload":{"linkedin_identifier":"jane-doe","job_id":17}}"#,
    );
    let malformed_id = client.push_message(DEFAULT_EVENT_QUEUE, "this is not json");

    let session = IngestSession::new(client.clone(), test_config());
    session.start().await;
    settle().await;

    let snapshot = session.snapshot();
    assert!(snapshot.is_streaming);
    assert_eq!(snapshot.stats.total, 1);
    assert_eq!(snapshot.stats.ok, 1);
    assert_eq!(snapshot.events.len(), 1);
    assert_eq!(snapshot.chart_series.len(), 1);
    assert!(snapshot.events[0].message.contains("jane-doe"));
    assert_eq!(snapshot.events[0].status, EventStatus::Ok);

    // Only the fully consumed message may be delete-batched; the malformed
    // one stays un-deleted for the redrive policy.
    let deleted = client.deleted_ids();
    assert!(deleted.contains(&valid_id));
    assert!(!deleted.contains(&malformed_id));

    session.stop().await;
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn start_resets_rolling_aggregates() {
    let client = prod_fleet();
    let session = IngestSession::new(client, test_config());

    // Seed aggregates outside a stream, as simulate mode does.
    session.publish_events(vec![eggi_ingest::synthetic::synthetic_event(
        &mut rand::thread_rng(),
    )]);
    assert_eq!(session.snapshot().stats.total, 1);

    session.start().await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.stats.total, 0);
    assert!(snapshot.events.is_empty());
    assert!(snapshot.chart_series.is_empty());

    session.stop().await;
}

#[tokio::test]
async fn start_while_streaming_is_a_no_op() {
    let client = prod_fleet();
    let session = IngestSession::new(client, test_config());

    session.start().await;
    session.publish_events(vec![eggi_ingest::synthetic::synthetic_event(
        &mut rand::thread_rng(),
    )]);

    // A second start must not reset what the first stream accumulated.
    session.start().await;
    assert_eq!(session.snapshot().stats.total, 1);

    session.stop().await;
}

#[tokio::test]
async fn depth_failures_retain_last_known_values() {
    let client = prod_fleet();
    client.set_attributes(MAPPING_QUEUE, depth_attributes("5", "1", "0"));

    let session = IngestSession::new(client.clone(), test_config());
    session.start().await;
    settle().await;

    let row = |snapshot: &eggi_ingest::DashboardSnapshot| {
        snapshot
            .queue_rows
            .iter()
            .find(|row| row.name == MAPPING_QUEUE)
            .cloned()
            .expect("mapping queue row present")
    };

    assert_eq!(row(&session.snapshot()).depths.visible, "5");

    // Every subsequent fetch fails; the published row must keep its value.
    client.fail_attributes(MAPPING_QUEUE, u32::MAX);
    settle().await;
    assert_eq!(row(&session.snapshot()).depths.visible, "5");

    session.stop().await;
}

#[tokio::test]
async fn depth_failure_with_no_prior_value_shows_error_sentinel() {
    let client = prod_fleet();
    client.fail_attributes(MAPPING_QUEUE, u32::MAX);

    let session = IngestSession::new(client, test_config());
    session.start().await;
    settle().await;

    let snapshot = session.snapshot();
    let row = snapshot
        .queue_rows
        .iter()
        .find(|row| row.name == MAPPING_QUEUE)
        .expect("mapping queue row present");
    assert_eq!(row.depths.visible, DEPTH_ERROR);
    assert_eq!(row.depths.in_flight, DEPTH_ERROR);

    session.stop().await;
}

#[tokio::test]
async fn environment_toggle_restarts_and_keeps_depth_snapshots() {
    let client = prod_fleet();
    client.set_attributes(MAPPING_QUEUE, depth_attributes("8", "2", "0"));

    let session = IngestSession::new(client.clone(), test_config());
    session.start().await;
    session.publish_events(vec![eggi_ingest::synthetic::synthetic_event(
        &mut rand::thread_rng(),
    )]);
    settle().await;
    assert!(session.snapshot().stats.total >= 1);

    session.set_use_dev_queues(true).await;

    let snapshot = session.snapshot();
    assert!(snapshot.use_dev_queues);
    assert!(snapshot.is_streaming, "toggle restarts an active stream");
    assert_eq!(snapshot.stats.total, 0, "toggle resets rolling aggregates");
    assert!(snapshot.queue_rows[0].name.starts_with("eggi-dev-"));

    // The dev fleet has produced nothing, so rows fall back to the prod
    // counterpart's last-known values.
    let dev_row = snapshot
        .queue_rows
        .iter()
        .find(|row| row.name.ends_with("mapping-service-profiles-to-analyse"))
        .expect("dev mapping row present");
    assert_eq!(dev_row.depths.visible, "8");

    session.stop().await;
}

#[tokio::test]
async fn stop_is_prompt_and_idempotent() {
    let client = prod_fleet();
    let session = IngestSession::new(client, test_config());

    session.start().await;
    assert!(session.is_streaming());

    // stop() must cancel the in-flight long-poll rather than wait it out.
    let stopped = tokio::time::timeout(Duration::from_secs(2), session.stop()).await;
    assert!(stopped.is_ok(), "stop() completed promptly");
    assert!(!session.is_streaming());

    // A second stop with no running pollers is harmless.
    session.stop().await;

    // The session can stream again after a stop.
    session.start().await;
    assert!(session.is_streaming());
    session.shutdown().await;
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn event_log_stays_bounded_under_sustained_load() {
    let client = prod_fleet();
    for i in 0..(MAX_EVENT_LOGS + 50) {
        client.push_message(
            DEFAULT_EVENT_QUEUE,
            &format!(r#"{{"event_source":"analysis-events","payload":{{"job_id":{i}}}}}"#),
        );
    }

    let session = IngestSession::new(client, test_config());
    session.start().await;
    settle().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.stats.total as usize, MAX_EVENT_LOGS + 50);
    assert_eq!(snapshot.events.len(), MAX_EVENT_LOGS);

    session.stop().await;
}
