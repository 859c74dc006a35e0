//! Notification side effects module
//!
//! This module contains the coordinator that reacts to finished intervals and
//! the feedback sinks that reach out to vibration, sound and flash devices.

pub mod feedback;
pub mod notification;

// Re-export main types
pub use feedback::{build_sink, FeedbackCommand, FeedbackCommands, FeedbackKind, FeedbackSink, NotificationStyle};
pub use notification::{
    CombinedSink, Continuation, NoopSink, NotificationCoordinator, NotificationSink, DEFAULT_FEEDBACK_DELAY,
};
