//! Progress poll loop
//!
//! One tokio task per planting session, ticking at a fixed period and pushing
//! each `/api/target_progress` result to the UI thread. The controller owns the
//! returned [`PollHandle`]; dropping or cancelling it stops the task.

use crate::api::PlantingClient;
use crate::types::ServiceEvent;
use eframe::egui;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    generation: u64,
}

impl PollHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(self) {
        self.token.cancel();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn a poll loop. The first request goes out one `period` after spawning.
///
/// The loop ends when the handle is cancelled, when the event channel closes,
/// or right after it reports a failed request.
pub fn spawn_poll_loop(
    runtime: &tokio::runtime::Handle,
    client: PlantingClient,
    period: Duration,
    generation: u64,
    events: UnboundedSender<ServiceEvent>,
    ctx: egui::Context,
) -> PollHandle {
    let token = CancellationToken::new();
    let task_token = token.clone();

    debug!(generation, period_ms = period.as_millis() as u64, "Starting poll loop");

    runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = task_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = task_token.cancelled() => break,
                result = client.target_progress() => result,
            };

            let failed = result.is_err();
            if events.send(ServiceEvent::Progress { generation, result }).is_err() {
                warn!(generation, "Event channel closed, ending poll loop");
                break;
            }
            ctx.request_repaint();

            if failed {
                break;
            }
        }

        debug!(generation, "Poll loop finished");
    });

    PollHandle { token, generation }
}
