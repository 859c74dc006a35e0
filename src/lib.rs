//! Interval Timer - lap-based work/rest countdowns with an HTTP control daemon
//!
//! The [`engine`] decides what a session does next, [`tasks`] drives it
//! against a real clock and publishes every change, and the [`api`] lets a
//! host start, pause, resume, stop and reconfigure it.

pub mod config;
pub mod error;
pub mod state;
pub mod engine;
pub mod services;
pub mod tasks;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Command, CommandError, CommandResult, Outcome};
pub use state::{AppState, Configuration, ContinuationMode, Laps, TimerPhase, TimerState};
pub use engine::TimerEngine;
pub use tasks::TimerService;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
