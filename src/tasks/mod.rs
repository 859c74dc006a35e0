//! Background tasks module
//!
//! This module contains the countdown clock and the timer service that drives
//! it alongside the engine.

pub mod countdown_clock;
pub mod timer_service;

// Re-export main types
pub use countdown_clock::{CountdownClock, DEFAULT_TICK_INTERVAL};
pub use timer_service::{ServiceSettings, TimerService};
