//! # Queue-Depth Poll Loop
//!
//! Samples approximate depth attributes for every queue in the active
//! environment on a fixed cadence and merges the results into published
//! state. Per-queue failures retain the last-known value: a cycle merges
//! with the previous snapshot, it never replaces it wholesale.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::constants::{attributes, DEPTH_ERROR, DEPTH_UNAVAILABLE};
use crate::messaging::{QueueClient, QueueError};
use crate::model::QueueDepths;
use crate::queues::QueueEnv;
use crate::state::SharedState;

/// Everything one depth-poller run needs.
pub(crate) struct DepthPollerContext {
    pub client: Arc<dyn QueueClient>,
    pub state: Arc<SharedState>,
    pub env: QueueEnv,
    pub config: IngestConfig,
    pub session_id: Uuid,
}

/// Run the depth-sampling loop until the streaming flag is observed false.
pub(crate) async fn run_depth_poller(ctx: DepthPollerContext) {
    let names = ctx.env.all_queues();
    info!(
        session_id = %ctx.session_id,
        env = ?ctx.env,
        queue_count = names.len(),
        "Starting queue-depth poller"
    );

    // URLs are stable for the lifetime of a run; resolve once per queue.
    let mut urls: HashMap<String, String> = HashMap::new();
    let mut ticker = tokio::time::interval(ctx.config.depth_poll_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        if !ctx.state.is_streaming() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = ctx.state.stop_requested() => break,
        }
        if !ctx.state.is_streaming() {
            break;
        }

        let cycle = sample_cycle(&ctx, &names, &mut urls).await;
        if !cycle.is_empty() {
            // One write-lock acquisition per cycle; readers never see a
            // half-merged snapshot.
            ctx.state.with_state(|state| state.merge_queue_depths(cycle));
        }
    }

    info!(session_id = %ctx.session_id, "Queue-depth poller terminated");
}

/// Attempt every queue once and collect the successful fetches. Failed
/// queues are simply absent from the returned map so their last-known
/// values survive the merge.
async fn sample_cycle(
    ctx: &DepthPollerContext,
    names: &[String],
    urls: &mut HashMap<String, String>,
) -> HashMap<String, QueueDepths> {
    let mut cycle = HashMap::with_capacity(names.len());

    for name in names {
        let url = match urls.get(name) {
            Some(url) => url.clone(),
            None => match ctx.client.get_queue_url(name).await {
                Ok(url) => {
                    urls.insert(name.clone(), url.clone());
                    url
                }
                Err(QueueError::NotFound { .. }) => {
                    debug!(queue = %name, "Queue has no URL, retaining stale row");
                    mark_error_if_unknown(ctx, name, &mut cycle);
                    continue;
                }
                Err(e) => {
                    warn!(queue = %name, error = %e, "Queue URL resolution failed");
                    mark_error_if_unknown(ctx, name, &mut cycle);
                    continue;
                }
            },
        };

        match ctx.client.get_attributes(&url).await {
            Ok(attrs) => {
                cycle.insert(name.clone(), depths_from_attributes(&attrs));
            }
            Err(e) => {
                warn!(queue = %name, error = %e,
                    "Attribute fetch failed, retaining last-known value");
                mark_error_if_unknown(ctx, name, &mut cycle);
            }
        }
    }

    cycle
}

/// A failed fetch must never blank a last-known value, but a queue that has
/// never produced data shows the error sentinel instead of staying silent.
/// A value under the counterpart environment's key counts as known: writing
/// the sentinel there would shadow the published fallback.
fn mark_error_if_unknown(
    ctx: &DepthPollerContext,
    name: &str,
    cycle: &mut HashMap<String, QueueDepths>,
) {
    let counterpart = ctx.env.counterpart(name);
    let known = ctx.state.read_state(|state| {
        state.has_queue_depths(name) || state.has_queue_depths(&counterpart)
    });
    if !known {
        cycle.insert(
            name.to_string(),
            QueueDepths::new(DEPTH_ERROR, DEPTH_ERROR, DEPTH_ERROR),
        );
    }
}

/// Project the service's attribute map onto the three published counters.
pub(crate) fn depths_from_attributes(attrs: &HashMap<String, String>) -> QueueDepths {
    let get = |key: &str| {
        attrs
            .get(key)
            .cloned()
            .unwrap_or_else(|| DEPTH_UNAVAILABLE.to_string())
    };
    QueueDepths::new(
        get(attributes::VISIBLE),
        get(attributes::IN_FLIGHT),
        get(attributes::DELAYED),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_projection_picks_the_three_counters() {
        let attrs = HashMap::from([
            (attributes::VISIBLE.to_string(), "12".to_string()),
            (attributes::IN_FLIGHT.to_string(), "3".to_string()),
            (attributes::DELAYED.to_string(), "0".to_string()),
            ("CreatedTimestamp".to_string(), "1700000000".to_string()),
        ]);

        let depths = depths_from_attributes(&attrs);
        assert_eq!(depths, QueueDepths::new("12", "3", "0"));
    }

    #[test]
    fn missing_attributes_render_the_unavailable_sentinel() {
        let attrs = HashMap::from([(attributes::VISIBLE.to_string(), "5".to_string())]);
        let depths = depths_from_attributes(&attrs);
        assert_eq!(depths.visible, "5");
        assert_eq!(depths.in_flight, DEPTH_UNAVAILABLE);
        assert_eq!(depths.delayed, DEPTH_UNAVAILABLE);
    }
}
