//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::NextStep,
    error::{CommandError, CommandResult, Outcome},
    state::{ContinuationMode, TimerState},
};

/// Response returned by every command endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    /// `applied`, `unchanged`, `rejected` or `unavailable`
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Timer state after the command
    pub state: TimerState,
}

impl CommandResponse {
    pub fn new(status: &str, message: String, state: TimerState) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Build the response describing a command result
    pub fn from_result(action: &str, result: &CommandResult, state: TimerState) -> Self {
        match result {
            Ok(Outcome::Applied) => Self::new("applied", format!("{} applied", action), state),
            Ok(Outcome::Unchanged) => {
                Self::new("unchanged", format!("{} had nothing to do", action), state)
            }
            Err(e @ CommandError::InvalidPhase { .. }) => Self::new("rejected", e.to_string(), state),
            Err(e @ CommandError::ShutDown) => Self::new("unavailable", e.to_string(), state),
        }
    }
}

/// Status response with timer and server information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub state: TimerState,
    /// Fraction of the current interval already elapsed
    pub progress: f64,
    /// Where a waiting completion will go next
    pub pending_step: Option<NextStep>,
    pub mode: ContinuationMode,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Body of `PUT /mode` and response of the mode endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: ContinuationMode,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
