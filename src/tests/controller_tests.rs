use super::*;
use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::time::Instant;

#[derive(Default)]
struct MockService {
    planting_active: bool,
    start_failure: Option<StatusCode>,
    stop_failure: Option<StatusCode>,
    /// `None` answers 404, like the device when nothing is planting
    progress_body: Option<Value>,
    start_calls: usize,
    stop_calls: usize,
    progress_calls: usize,
    last_start: Option<Value>,
}

type Shared = Arc<Mutex<MockService>>;

async fn handle_is_planting(State(state): State<Shared>) -> Json<Value> {
    let active = state.lock().unwrap().planting_active;
    Json(json!({ "plantingActive": active }))
}

async fn handle_start(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.start_calls += 1;
    s.last_start = Some(body);
    if let Some(code) = s.start_failure {
        return Err(code);
    }
    s.planting_active = true;
    Ok(Json(json!({ "message": "Planting started", "targetProgress": 90 })))
}

async fn handle_stop(State(state): State<Shared>) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.stop_calls += 1;
    if let Some(code) = s.stop_failure {
        return Err(code);
    }
    s.planting_active = false;
    Ok(Json(json!({ "message": "Planting stopped" })))
}

async fn handle_progress(State(state): State<Shared>) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.progress_calls += 1;
    s.progress_body.clone().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn spawn_service(state: Shared) -> PlantingClient {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/is_planting", get(handle_is_planting))
        .route("/api/start_planting", post(handle_start))
        .route("/api/stop_planting", post(handle_stop))
        .route("/api/target_progress", get(handle_progress))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    PlantingClient::new(format!("http://{addr}")).expect("client")
}

/// Client for a port nothing listens on
async fn dead_client() -> PlantingClient {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    PlantingClient::new(format!("http://{addr}")).expect("client")
}

fn controller_for(client: PlantingClient, poll_ms: u64) -> Controller {
    Controller::new(
        client,
        tokio::runtime::Handle::current(),
        egui::Context::default(),
        Duration::from_millis(poll_ms),
        Some(Database::open_in_memory().expect("db")),
    )
}

async fn harness(service: MockService, poll_ms: u64) -> (Controller, Shared) {
    let state = Arc::new(Mutex::new(service));
    let client = spawn_service(state.clone()).await;
    (controller_for(client, poll_ms), state)
}

fn fill_valid_form(controller: &mut Controller) {
    controller.form = PlantingForm {
        x: "2".into(),
        y: "3".into(),
        column_separation: "0.5".into(),
        seed_spacing: "0.1".into(),
        dispense_water: true,
    };
}

/// Drain events until `cond` holds, failing after a few seconds
async fn settle(controller: &mut Controller, what: &str, cond: impl Fn(&Controller) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        controller.drain_events();
        if cond(controller) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Give background work time to land, then apply it
async fn pause_and_drain(controller: &mut Controller, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    controller.drain_events();
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_form_never_reaches_the_service() {
    let (mut controller, state) = harness(MockService::default(), 20).await;

    for field in 0..4 {
        fill_valid_form(&mut controller);
        let bad = match field {
            0 => &mut controller.form.x,
            1 => &mut controller.form.y,
            2 => &mut controller.form.column_separation,
            _ => &mut controller.form.seed_spacing,
        };
        *bad = if field % 2 == 0 { "0".into() } else { "seeds".into() };

        assert!(controller.start_planting().is_err());
        assert_eq!(controller.notice(), Some(VALIDATION_NOTICE));
        controller.dismiss_notice();
        assert_eq!(controller.notice(), None);
    }

    pause_and_drain(&mut controller, 100).await;
    assert_eq!(state.lock().unwrap().start_calls, 0);
    assert_eq!(controller.mode(), UiMode::Input);
    assert!(!controller.is_start_pending());
}

#[tokio::test(flavor = "multi_thread")]
async fn accepted_start_shows_empty_planting_screen() {
    // Long interval so no tick lands before the assertions
    let (mut controller, state) = harness(MockService::default(), 10_000).await;
    controller.progress = Progress { current: 4.0, target: 8.0 };
    controller.render_progress();
    assert_eq!(controller.bar().percent, 50.0);

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    assert!(controller.is_start_pending());

    settle(&mut controller, "planting screen", |c| c.mode() == UiMode::Planting).await;

    assert_eq!(controller.progress(), Progress { current: 0.0, target: 0.0 });
    assert_eq!(controller.bar(), BarLayout::default());
    assert!(controller.is_polling());
    assert!(!controller.is_complete());
    assert_eq!(controller.heading(), PLANTING_TITLE);
    assert_eq!(controller.inline_error(), None);
    assert!(!controller.is_start_pending());

    let body = state.lock().unwrap().last_start.clone().expect("start body");
    assert_eq!(
        body,
        json!({
            "x": 2.0,
            "y": 3.0,
            "columnSeparation": 0.5,
            "seedSpacing": 0.1,
            "dispenseWater": true
        })
    );

    let runs = controller.recent_runs(10);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].outcome, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_start_shows_inline_error() {
    let service = MockService {
        start_failure: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..MockService::default()
    };
    let (mut controller, state) = harness(service, 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "start result", |c| !c.is_start_pending()).await;

    assert_eq!(controller.mode(), UiMode::Input);
    assert_eq!(controller.inline_error(), Some(START_FAILED_MESSAGE));
    assert!(!controller.is_polling());
    assert_eq!(state.lock().unwrap().start_calls, 1);
    assert!(controller.recent_runs(10).is_empty());

    // Trying again clears the previous message straight away
    controller.start_planting().expect("valid form");
    assert_eq!(controller.inline_error(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn half_progress_renders_half_bar() {
    let service = MockService {
        progress_body: Some(json!({ "currentProgress": 5, "targetProgress": 10 })),
        ..MockService::default()
    };
    let (mut controller, _state) = harness(service, 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "first progress", |c| c.progress().target == 10.0).await;

    let bar = controller.bar();
    assert_eq!(bar.percent, 50.0);
    assert_eq!(
        bar.marker_offset,
        DEFAULT_TRACK_WIDTH * 0.5 - DEFAULT_MARKER_WIDTH / 2.0
    );
    assert!(controller.is_polling());
    assert!(!controller.is_complete());

    controller.set_bar_metrics(200.0, 20.0);
    assert_eq!(controller.bar().marker_offset, 90.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn reaching_the_target_completes_once() {
    let service = MockService {
        progress_body: Some(json!({ "currentProgress": 10, "targetProgress": 10 })),
        ..MockService::default()
    };
    let (mut controller, state) = harness(service, 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "completion", |c| c.is_complete()).await;

    assert!(!controller.is_polling());
    assert_eq!(controller.mode(), UiMode::Planting);
    assert_eq!(controller.heading(), COMPLETE_TITLE);
    assert_eq!(controller.bar().percent, 100.0);

    let calls = state.lock().unwrap().progress_calls;
    let version = controller.history_version();
    pause_and_drain(&mut controller, 150).await;
    assert_eq!(state.lock().unwrap().progress_calls, calls);

    // A second completion signal changes nothing
    controller.planting_complete();
    assert_eq!(controller.history_version(), version);

    let runs = controller.recent_runs(10);
    assert_eq!(runs[0].outcome, Some(RunOutcome::Completed));
    assert_eq!(runs[0].progress, Some(Progress { current: 10.0, target: 10.0 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_progress_is_ignored() {
    let service = MockService {
        progress_body: Some(json!({ "currentProgress": "5", "targetProgress": 10 })),
        ..MockService::default()
    };
    let (mut controller, state) = harness(service, 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "planting screen", |c| c.mode() == UiMode::Planting).await;

    let deadline = Instant::now() + Duration::from_secs(3);
    while state.lock().unwrap().progress_calls < 3 {
        assert!(Instant::now() < deadline, "poll loop never ticked");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    pause_and_drain(&mut controller, 30).await;

    assert_eq!(controller.progress(), Progress::default());
    assert!(controller.is_polling());
    assert!(!controller.error_banner_visible());
    assert_eq!(controller.mode(), UiMode::Planting);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_poll_shows_banner_and_stops() {
    // No progress body: the service answers 404
    let (mut controller, state) = harness(MockService::default(), 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "error banner", |c| c.error_banner_visible()).await;

    assert!(!controller.is_polling());
    assert_eq!(controller.mode(), UiMode::Planting);

    let calls = state.lock().unwrap().progress_calls;
    pause_and_drain(&mut controller, 150).await;
    assert_eq!(state.lock().unwrap().progress_calls, calls);
    assert_eq!(controller.recent_runs(1)[0].outcome, Some(RunOutcome::Failed));
}

#[tokio::test(flavor = "multi_thread")]
async fn network_error_during_poll_shows_banner() {
    let mut controller = controller_for(dead_client().await, 20);
    controller.mode = UiMode::Planting;
    controller.start_polling();

    settle(&mut controller, "error banner", |c| c.error_banner_visible()).await;
    assert!(!controller.is_polling());
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_returns_home_even_when_the_call_fails() {
    let service = MockService {
        progress_body: Some(json!({ "currentProgress": 1, "targetProgress": 10 })),
        stop_failure: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..MockService::default()
    };
    let (mut controller, state) = harness(service, 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "first progress", |c| c.progress().target == 10.0).await;

    controller.stop_planting();
    assert!(!controller.is_polling(), "poll loop must stop before the call returns");
    assert!(controller.is_stop_pending());

    settle(&mut controller, "home screen", |c| {
        c.mode() == UiMode::Input && !c.is_stop_pending()
    })
    .await;

    assert_eq!(state.lock().unwrap().stop_calls, 1);
    assert_eq!(controller.form, PlantingForm::default());
    assert_eq!(controller.progress(), Progress::default());
    assert_eq!(controller.bar(), BarLayout::default());
    assert_eq!(controller.recent_runs(1)[0].outcome, Some(RunOutcome::Stopped));
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_returns_home_when_service_is_unreachable() {
    let mut controller = controller_for(dead_client().await, 10_000);
    controller.mode = UiMode::Planting;
    controller.start_polling();

    controller.stop_planting();
    assert!(!controller.is_polling());
    settle(&mut controller, "home screen", |c| !c.is_stop_pending()).await;
    assert_eq!(controller.mode(), UiMode::Input);
}

#[tokio::test(flavor = "multi_thread")]
async fn load_check_resumes_an_active_session() {
    let service = MockService {
        planting_active: true,
        progress_body: Some(json!({ "currentProgress": 30, "targetProgress": 90 })),
        ..MockService::default()
    };
    let (mut controller, _state) = harness(service, 20).await;

    controller.check_active_session();
    settle(&mut controller, "resumed progress", |c| {
        c.mode() == UiMode::Planting && c.progress().current == 30.0
    })
    .await;
    assert!(controller.is_polling());
}

#[tokio::test(flavor = "multi_thread")]
async fn resumed_session_clears_finished_state() {
    let mut controller = controller_for(dead_client().await, 10_000);
    controller.mode = UiMode::Planting;
    controller.complete = true;
    controller.error_banner = true;

    // e.g. the service URL changed and the new device is mid-run
    controller.handle_event(ServiceEvent::SessionCheck(Ok(true)));

    assert_eq!(controller.mode(), UiMode::Planting);
    assert!(controller.is_polling());
    assert!(!controller.is_complete());
    assert_eq!(controller.heading(), PLANTING_TITLE);
    assert!(!controller.error_banner_visible());
}

#[tokio::test(flavor = "multi_thread")]
async fn load_check_without_session_stays_on_input() {
    let (mut controller, _state) = harness(MockService::default(), 20).await;

    controller.check_active_session();
    pause_and_drain(&mut controller, 200).await;
    assert_eq!(controller.mode(), UiMode::Input);
    assert!(!controller.is_polling());

    let mut offline = controller_for(dead_client().await, 20);
    offline.check_active_session();
    pause_and_drain(&mut offline, 200).await;
    assert_eq!(offline.mode(), UiMode::Input);
    assert!(!offline.is_polling());
    assert!(!offline.error_banner_visible());
}

#[tokio::test(flavor = "multi_thread")]
async fn return_home_clears_the_session() {
    let service = MockService {
        progress_body: Some(json!({ "currentProgress": 90, "targetProgress": 90 })),
        ..MockService::default()
    };
    let (mut controller, _state) = harness(service, 20).await;

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "completion", |c| c.is_complete()).await;

    controller.error_banner = true;
    controller.return_home();

    assert_eq!(controller.mode(), UiMode::Input);
    assert_eq!(controller.form, PlantingForm::default());
    assert_eq!(controller.progress(), Progress::default());
    assert_eq!(controller.bar(), BarLayout::default());
    assert!(!controller.error_banner_visible());
    assert!(!controller.is_complete());
    assert_eq!(controller.heading(), PLANTING_TITLE);
}

#[tokio::test(flavor = "multi_thread")]
async fn restarting_the_poll_loop_discards_stale_results() {
    let (mut controller, _state) = harness(MockService::default(), 10_000).await;
    controller.mode = UiMode::Planting;

    controller.start_polling();
    let stale = controller.poll_generation;
    controller.start_polling();
    let live = controller.poll_generation;
    assert_ne!(stale, live);

    controller
        .events_tx
        .send(ServiceEvent::Progress {
            generation: stale,
            result: Ok(Some(Progress { current: 3.0, target: 4.0 })),
        })
        .expect("send");
    controller.drain_events();
    assert_eq!(controller.progress(), Progress::default());

    controller
        .events_tx
        .send(ServiceEvent::Progress {
            generation: live,
            result: Ok(Some(Progress { current: 3.0, target: 4.0 })),
        })
        .expect("send");
    controller.drain_events();
    assert_eq!(controller.progress(), Progress { current: 3.0, target: 4.0 });
    assert_eq!(controller.bar().percent, 75.0);
    assert!(controller.is_polling());
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_history_empties_the_run_log() {
    let service = MockService {
        progress_body: Some(json!({ "currentProgress": 1, "targetProgress": 1 })),
        ..MockService::default()
    };
    let (mut controller, _state) = harness(service, 20).await;
    assert!(controller.has_history());

    fill_valid_form(&mut controller);
    controller.start_planting().expect("valid form");
    settle(&mut controller, "completion", |c| c.is_complete()).await;
    assert_eq!(controller.recent_runs(10).len(), 1);

    let version = controller.history_version();
    controller.clear_history();
    assert!(controller.recent_runs(10).is_empty());
    assert!(controller.history_version() > version);
}
