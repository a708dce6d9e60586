//! Planting UI controller
//!
//! Owns the planting session (progress counts, poll handle, visible screen)
//! and turns user actions and service results into state changes. Network
//! calls run on the tokio runtime; their results come back as
//! [`ServiceEvent`]s that [`Controller::drain_events`] applies on the UI thread.

use crate::api::PlantingClient;
use crate::constants::*;
use crate::db::{Database, RunOutcome, RunRecord};
use crate::error::ValidationError;
use crate::form::PlantingForm;
use crate::poller::{spawn_poll_loop, PollHandle};
use crate::progress::BarLayout;
use crate::types::*;
use eframe::egui;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

pub struct Controller {
    client: PlantingClient,
    runtime: tokio::runtime::Handle,
    ctx: egui::Context,
    events_tx: UnboundedSender<ServiceEvent>,
    events_rx: UnboundedReceiver<ServiceEvent>,
    // Session
    poll: Option<PollHandle>,
    poll_generation: u64,
    poll_interval: Duration,
    progress: Progress,
    // View state
    pub form: PlantingForm,
    mode: UiMode,
    bar: BarLayout,
    track_width: f32,
    marker_width: f32,
    complete: bool,
    inline_error: Option<String>,
    error_banner: bool,
    notice: Option<String>,
    start_pending: bool,
    stop_pending: bool,
    // History
    history: Option<Database>,
    active_run: Option<i64>,
    history_version: u64,
}

impl Controller {
    pub fn new(
        client: PlantingClient,
        runtime: tokio::runtime::Handle,
        ctx: egui::Context,
        poll_interval: Duration,
        history: Option<Database>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            client,
            runtime,
            ctx,
            events_tx,
            events_rx,
            poll: None,
            poll_generation: 0,
            poll_interval,
            progress: Progress::default(),
            form: PlantingForm::default(),
            mode: UiMode::Input,
            bar: BarLayout::default(),
            track_width: DEFAULT_TRACK_WIDTH,
            marker_width: DEFAULT_MARKER_WIDTH,
            complete: false,
            inline_error: None,
            error_banner: false,
            notice: None,
            start_pending: false,
            stop_pending: false,
            history,
            active_run: None,
            history_version: 0,
        }
    }

    // ========================================================================
    // USER ACTIONS
    // ========================================================================

    /// Ask the service whether a session is already running (app load).
    pub fn check_active_session(&mut self) {
        info!(url = self.client.base_url(), "Checking for an active planting session");
        self.spawn_call(|client| async move { ServiceEvent::SessionCheck(client.is_planting().await) });
    }

    /// Validate the form and submit it. Invalid input raises the blocking
    /// notice and never reaches the network.
    pub fn start_planting(&mut self) -> Result<(), ValidationError> {
        self.inline_error = None;

        let request = match self.form.validate() {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Planting form rejected");
                self.notice = Some(VALIDATION_NOTICE.to_string());
                return Err(e);
            }
        };

        if self.start_pending {
            debug!("Start already in flight, ignoring");
            return Ok(());
        }
        self.start_pending = true;

        info!(
            x = request.x,
            y = request.y,
            column_separation = request.column_separation,
            seed_spacing = request.seed_spacing,
            dispense_water = request.dispense_water,
            "Requesting planting start"
        );
        self.spawn_call(move |client| async move {
            let result = client.start_planting(&request).await;
            ServiceEvent::StartFinished { request, result }
        });
        Ok(())
    }

    /// Cancel polling right away, then ask the service to stop. The UI returns
    /// home once the call finishes, whatever its outcome.
    pub fn stop_planting(&mut self) {
        self.stop_polling();
        self.stop_pending = true;
        info!("Requesting planting stop");
        self.spawn_call(|client| async move { ServiceEvent::StopFinished(client.stop_planting().await) });
    }

    pub fn return_home(&mut self) {
        info!("Returning to input screen");
        self.reset_to_home();
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Swap the service client (URL changed). A running poll loop is re-armed
    /// against the new client.
    pub fn set_client(&mut self, client: PlantingClient) {
        info!(url = client.base_url(), "Planting service changed");
        self.client = client;
        if self.poll.is_some() {
            self.start_polling();
        }
    }

    /// Takes effect the next time a poll loop starts
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Feed the measured track and marker widths; re-renders when they change.
    pub fn set_bar_metrics(&mut self, track_width: f32, marker_width: f32) {
        if (track_width - self.track_width).abs() < 0.5 && (marker_width - self.marker_width).abs() < 0.5 {
            return;
        }
        self.track_width = track_width;
        self.marker_width = marker_width;
        self.render_progress();
    }

    pub fn shutdown(&mut self) {
        self.stop_polling();
    }

    // ========================================================================
    // SERVICE EVENTS
    // ========================================================================

    /// Apply every pending service result. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    fn handle_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::SessionCheck(Ok(true)) => {
                info!("Planting session already active, resuming progress view");
                self.mode = UiMode::Planting;
                self.complete = false;
                self.error_banner = false;
                self.start_polling();
            }
            ServiceEvent::SessionCheck(Ok(false)) => {
                debug!("No active planting session");
                if self.poll.is_none() && !self.start_pending {
                    self.mode = UiMode::Input;
                }
            }
            ServiceEvent::SessionCheck(Err(e)) => {
                error!(error = %e, "Failed to check planting status");
            }
            ServiceEvent::StartFinished { request, result } => {
                self.start_pending = false;
                match result {
                    Ok(()) => {
                        info!("Planting started");
                        self.progress = Progress::default();
                        self.bar = BarLayout::default();
                        self.render_progress();
                        self.complete = false;
                        self.error_banner = false;
                        self.mode = UiMode::Planting;
                        self.record_run_start(&request);
                        self.start_polling();
                    }
                    Err(e) => {
                        error!(error = %e, "Error starting planting");
                        self.inline_error = Some(START_FAILED_MESSAGE.to_string());
                    }
                }
            }
            ServiceEvent::StopFinished(result) => {
                self.stop_pending = false;
                match result {
                    Ok(()) => info!("Planting stopped"),
                    Err(e) => warn!(error = %e, "Error stopping planting, returning home anyway"),
                }
                self.finish_run(RunOutcome::Stopped);
                self.reset_to_home();
            }
            ServiceEvent::Progress { generation, result } => {
                self.apply_progress(generation, result);
            }
        }
    }

    fn apply_progress(
        &mut self,
        generation: u64,
        result: Result<Option<Progress>, crate::error::ApiError>,
    ) {
        if self.poll.as_ref().map(PollHandle::generation) != Some(generation) {
            debug!(generation, "Discarding result from a stopped poll loop");
            return;
        }

        match result {
            Ok(Some(progress)) => {
                debug!(current = progress.current, target = progress.target, "Progress update");
                self.progress = progress;
                self.render_progress();
                if progress.is_complete() {
                    self.planting_complete();
                }
            }
            Ok(None) => {
                debug!("Ignoring progress payload without numeric counts");
            }
            Err(e) => {
                error!(
                    error = %e,
                    endpoint = e.endpoint().unwrap_or("-"),
                    "Error fetching current progress"
                );
                self.error_banner = true;
                self.stop_polling();
                self.finish_run(RunOutcome::Failed);
            }
        }
    }

    // ========================================================================
    // SESSION HELPERS
    // ========================================================================

    fn spawn_call<F, Fut>(&self, call: F)
    where
        F: FnOnce(PlantingClient) -> Fut,
        Fut: Future<Output = ServiceEvent> + Send + 'static,
    {
        let fut = call(self.client.clone());
        let tx = self.events_tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let event = fut.await;
            if tx.send(event).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    /// Start (or restart) the poll loop; the previous loop is cancelled first.
    fn start_polling(&mut self) {
        self.stop_polling();
        self.poll_generation += 1;
        self.poll = Some(spawn_poll_loop(
            &self.runtime,
            self.client.clone(),
            self.poll_interval,
            self.poll_generation,
            self.events_tx.clone(),
            self.ctx.clone(),
        ));
    }

    /// Returns true if a loop was running
    fn stop_polling(&mut self) -> bool {
        match self.poll.take() {
            Some(handle) => {
                debug!(generation = handle.generation(), "Stopping poll loop");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    fn planting_complete(&mut self) {
        if !self.stop_polling() {
            return;
        }
        info!(
            current = self.progress.current,
            target = self.progress.target,
            "Planting complete"
        );
        self.complete = true;
        self.finish_run(RunOutcome::Completed);
    }

    /// No-op while the target is zero; the bar keeps its last layout.
    fn render_progress(&mut self) {
        if let Some(layout) = BarLayout::compute(
            self.progress.current,
            self.progress.target,
            self.track_width,
            self.marker_width,
        ) {
            self.bar = layout;
        }
    }

    fn reset_to_home(&mut self) {
        self.stop_polling();
        self.mode = UiMode::Input;
        self.form.clear();
        self.progress = Progress::default();
        self.bar = BarLayout::default();
        self.render_progress();
        self.complete = false;
        self.error_banner = false;
        self.inline_error = None;
    }

    fn record_run_start(&mut self, request: &PlantingRequest) {
        let Some(db) = &self.history else { return };
        match db.record_start(request) {
            Ok(id) => {
                self.active_run = Some(id);
                self.history_version += 1;
            }
            Err(e) => warn!(error = %e, "Failed to record planting run"),
        }
    }

    fn finish_run(&mut self, outcome: RunOutcome) {
        let Some(run_id) = self.active_run.take() else { return };
        let Some(db) = &self.history else { return };
        let progress = (self.progress.target > 0.0).then_some(self.progress);
        match db.record_outcome(run_id, outcome, progress) {
            Ok(_) => {
                debug!(run_id, outcome = outcome.as_str(), "Run finished");
                self.history_version += 1;
            }
            Err(e) => warn!(run_id, error = %e, "Failed to record run outcome"),
        }
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    /// Bumped whenever the run history changes
    pub fn history_version(&self) -> u64 {
        self.history_version
    }

    pub fn recent_runs(&self, limit: usize) -> Vec<RunRecord> {
        let Some(db) = &self.history else { return Vec::new() };
        db.recent_runs(limit).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load run history");
            Vec::new()
        })
    }

    pub fn clear_history(&mut self) {
        let Some(db) = &self.history else { return };
        match db.clear_runs() {
            Ok(()) => {
                info!("Run history cleared");
                self.history_version += 1;
            }
            Err(e) => warn!(error = %e, "Failed to clear run history"),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn bar(&self) -> BarLayout {
        self.bar
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn heading(&self) -> &'static str {
        if self.complete {
            COMPLETE_TITLE
        } else {
            PLANTING_TITLE
        }
    }

    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn error_banner_visible(&self) -> bool {
        self.error_banner
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_start_pending(&self) -> bool {
        self.start_pending
    }

    pub fn is_stop_pending(&self) -> bool {
        self.stop_pending
    }

    pub fn service_url(&self) -> &str {
        self.client.base_url()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
