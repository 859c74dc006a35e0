//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::{
    error::{CommandError, CommandResult},
    state::{AppState, Configuration},
};
use super::responses::{CommandResponse, HealthResponse, ModeBody, StatusResponse};

type CommandReply = (StatusCode, Json<CommandResponse>);

/// Turn a command result into a status code and body carrying the new state
fn reply(state: &AppState, action: &str, result: CommandResult) -> CommandReply {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(CommandError::InvalidPhase { .. }) => StatusCode::CONFLICT,
        Err(CommandError::ShutDown) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let body = CommandResponse::from_result(action, &result, state.timer.current());
    (status, Json(body))
}

/// Handle POST /start - Start a session, optionally with a new configuration
pub async fn start_handler(State(state): State<Arc<AppState>>, body: Bytes) -> CommandReply {
    let configuration = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<Configuration>(&body) {
            Ok(configuration) => Some(configuration),
            Err(e) => {
                warn!("Invalid configuration in start request: {}", e);
                let message = format!("invalid configuration: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(CommandResponse::new("rejected", message, state.timer.current())),
                );
            }
        }
    };

    let result = state.run_command("start", |timer| match configuration {
        Some(configuration) => timer.start(configuration),
        None => timer.start_current(),
    });
    reply(&state, "start", result)
}

/// Handle POST /pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> CommandReply {
    let result = state.run_command("pause", |timer| timer.pause());
    reply(&state, "pause", result)
}

/// Handle POST /resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> CommandReply {
    let result = state.run_command("resume", |timer| timer.resume());
    reply(&state, "resume", result)
}

/// Handle POST /stop
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> CommandReply {
    let result = state.run_command("stop", |timer| timer.stop());
    reply(&state, "stop", result)
}

/// Handle POST /dismiss - Dismiss an active alarm
pub async fn dismiss_handler(State(state): State<Arc<AppState>>) -> CommandReply {
    let result = state.run_command("dismiss", |timer| timer.dismiss_alarm());
    reply(&state, "dismiss", result)
}

/// Handle PUT /configuration - Swap configuration, rescaling a live session
pub async fn configuration_handler(
    State(state): State<Arc<AppState>>,
    Json(configuration): Json<Configuration>,
) -> CommandReply {
    let result = state.run_command("configuration", |timer| {
        timer.update_configuration(configuration)
    });
    reply(&state, "configuration", result)
}

/// Handle GET /mode
pub async fn get_mode_handler(State(state): State<Arc<AppState>>) -> Json<ModeBody> {
    Json(ModeBody { mode: state.mode() })
}

/// Handle PUT /mode - Switch between auto and manual continuation
pub async fn set_mode_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ModeBody>,
) -> Json<ModeBody> {
    state.set_mode(body.mode);
    Json(ModeBody { mode: state.mode() })
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        state: state.timer.current(),
        progress: state.timer.progress(),
        pending_step: state.timer.pending_step(),
        mode: state.mode(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /events - Stream every timer snapshot as Server-Sent Events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New event stream subscriber");

    let stream = state.timer.subscribe().into_stream().filter_map(|snapshot| async move {
        match Event::default().event("state").json_data(&snapshot) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!("Failed to encode timer state event: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
