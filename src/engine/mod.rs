//! Timer engine module
//!
//! The lap/phase state machine and the rescale arithmetic it applies when the
//! configuration changes mid-session. Nothing in here touches the clock or
//! performs I/O.

#[allow(clippy::module_inception)]
pub mod engine;
pub mod rescale;

// Re-export main types
pub use engine::{ClockDemand, NextStep, PhaseCompletion, TimerEngine};
pub use rescale::{progress, rescale_remaining};
