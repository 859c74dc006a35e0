//! HTTP API behaviour against an in-process router

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;

use interval_timer::{
    api::create_router,
    services::NotificationCoordinator,
    state::{AppState, Configuration, ContinuationMode, StatePublisher, TimerState},
    tasks::{ServiceSettings, TimerService},
};

fn app() -> Router {
    let (mode_tx, mode_rx) = watch::channel(ContinuationMode::Auto);
    let coordinator = NotificationCoordinator::new(
        Arc::new(interval_timer::services::NoopSink),
        mode_rx,
        interval_timer::services::DEFAULT_FEEDBACK_DELAY,
    );
    let timer = TimerService::new(
        Configuration::default(),
        coordinator,
        Arc::new(StatePublisher::new(TimerState::default())),
        ServiceSettings::default(),
    )
    .unwrap();
    let state = AppState::new(timer, mode_tx, 20554, "127.0.0.1".to_string());
    create_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn start_then_start_again_conflicts() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "applied");
    assert_eq!(body["state"]["phase"], "running");
    assert_eq!(body["state"]["current_lap"], 1);

    let (status, body) = send(&app, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["message"], "cannot start while running");
    assert_eq!(body["state"]["phase"], "running");
}

#[tokio::test]
async fn start_with_configuration_body_uses_it() {
    let app = app();
    let config = json!({ "laps": "unbounded", "work_secs": 45, "rest_secs": 15 });

    let (status, body) = send(&app, Method::POST, "/start", Some(config)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["total_laps"], "unbounded");
    assert_eq!(body["state"]["configuration"]["work_secs"], 45);
    assert_eq!(body["state"]["time_remaining_secs"], 45);
}

#[tokio::test]
async fn start_with_malformed_body_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/start")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"laps\": true"))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, status) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status["state"]["phase"], "stopped");
}

#[tokio::test]
async fn pause_resume_and_stop_round_trip() {
    let app = app();
    send(&app, Method::POST, "/start", None).await;

    let (status, body) = send(&app, Method::POST, "/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["phase"], "paused");

    let (_, body) = send(&app, Method::POST, "/pause", None).await;
    assert_eq!(body["status"], "unchanged");

    let (_, body) = send(&app, Method::POST, "/resume", None).await;
    assert_eq!(body["state"]["phase"], "running");

    let (status, body) = send(&app, Method::POST, "/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["phase"], "stopped");
    assert_eq!(body["state"]["time_remaining_secs"], 20);
}

#[tokio::test]
async fn dismiss_without_alarm_conflicts() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/dismiss", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["state"]["phase"], "stopped");
}

#[tokio::test]
async fn configuration_update_while_stopped_replaces_preview() {
    let app = app();
    let config = json!({ "laps": 3, "work_secs": 90 });

    let (status, body) = send(&app, Method::PUT, "/configuration", Some(config.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "applied");
    assert_eq!(body["state"]["total_laps"], 3);
    assert_eq!(body["state"]["time_remaining_secs"], 90);
    assert_eq!(body["state"]["configuration"]["rest_secs"], 0);

    let (_, body) = send(&app, Method::PUT, "/configuration", Some(config)).await;
    assert_eq!(body["status"], "unchanged");
}

#[tokio::test]
async fn configuration_with_wrong_shape_is_rejected_by_extractor() {
    let app = app();
    let (status, _) = send(&app, Method::PUT, "/configuration", Some(json!({ "laps": 3 }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn mode_can_be_read_and_switched() {
    let app = app();

    let (_, body) = send(&app, Method::GET, "/mode", None).await;
    assert_eq!(body["mode"], "auto");

    let (status, body) = send(&app, Method::PUT, "/mode", Some(json!({ "mode": "manual" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "manual");

    let (_, status) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status["mode"], "manual");
    assert_eq!(status["last_action"], "mode-manual");
}

#[tokio::test]
async fn status_reports_timer_and_server_details() {
    let app = app();
    send(&app, Method::POST, "/start", None).await;

    let (status, body) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["phase"], "running");
    assert_eq!(body["port"], 20554);
    assert_eq!(body["host"], "127.0.0.1");
    assert_eq!(body["last_action"], "start");
    assert!(body["pending_step"].is_null());
    assert!(body["progress"].as_f64().unwrap() < 1.0);
}

#[tokio::test]
async fn events_stream_starts_with_current_state() {
    let app = app();
    let request = Request::builder().uri("/events").body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut frames = response.into_body().into_data_stream();
    let first = frames.next().await.unwrap().unwrap();
    let text = String::from_utf8(first.to_vec()).unwrap();
    assert!(text.starts_with("event: state\n"), "unexpected frame: {}", text);
    assert!(text.contains("\"phase\":\"stopped\""));
}
