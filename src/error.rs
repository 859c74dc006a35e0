//! Error types for timer commands

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::state::TimerPhase;

/// Commands a host can issue to the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    DismissAlarm,
    UpdateConfiguration,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::DismissAlarm => "dismiss_alarm",
            Command::UpdateConfiguration => "update_configuration",
        };
        f.write_str(name)
    }
}

/// A command the timer refused. Always recoverable; the state is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command makes no sense in the current phase
    #[error("cannot {command} while {phase}")]
    InvalidPhase { command: Command, phase: TimerPhase },

    /// The timer service has been shut down
    #[error("timer service is shut down")]
    ShutDown,
}

/// What an accepted command did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// State changed
    Applied,
    /// Already in the requested state; nothing to do
    Unchanged,
}

pub type CommandResult = Result<Outcome, CommandError>;
