//! State management module
//!
//! Data types describing a workout and the snapshots the timer publishes,
//! plus the publisher that fans those snapshots out and the host's
//! application state.

pub mod app_state;
pub mod configuration;
pub mod mode;
pub mod publisher;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use configuration::{Configuration, Laps};
pub use mode::ContinuationMode;
pub use publisher::{StatePublisher, StateSubscription};
pub use timer_state::{Interval, TimerPhase, TimerState};
