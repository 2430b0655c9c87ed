//! Poller loop — fixed-cadence ticks driving the lifecycle scheduler.
//! Uses tokio::interval for zero-overhead ticking (sleeps between checks).

use std::sync::Arc;

use crate::lifecycle::LifecycleScheduler;

/// Spawnable poller loop. Ticks never overlap: if a cycle outlasts the
/// cadence, the next due tick is skipped and the state is re-evaluated on
/// the one after.
pub async fn spawn_poller(scheduler: Arc<LifecycleScheduler>, interval_secs: u64) {
    tracing::info!("⏰ Outreach poller started (every {interval_secs}s)");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match scheduler.try_tick().await {
            Some(report) => {
                for failure in &report.failures {
                    tracing::warn!(
                        tick_id = %report.tick_id,
                        contact_id = %failure.contact_id,
                        stage = failure.stage,
                        "Tick failure: {}",
                        failure.message
                    );
                }
            }
            None => {
                tracing::warn!("⚠️ Previous tick still running; skipping this cycle");
            }
        }
    }
}
