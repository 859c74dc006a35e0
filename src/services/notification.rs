//! Phase-completion notification coordination

use std::{fmt, sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::debug;

use crate::{engine::PhaseCompletion, state::ContinuationMode};

/// Default pause between an auto-mode completion and moving on, long enough
/// for completion feedback to play
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1_500);

/// Receives every phase completion, including the last one of a session.
///
/// Implementations must return promptly: they are called while the timer
/// holds its state lock. Slow work belongs on a spawned task.
pub trait NotificationSink: Send + Sync + fmt::Debug {
    fn on_phase_complete(&self, completion: &PhaseCompletion);
}

/// Sink that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn on_phase_complete(&self, _completion: &PhaseCompletion) {}
}

/// Fans a completion out to several sinks in order
#[derive(Debug, Default, Clone)]
pub struct CombinedSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl CombinedSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for CombinedSink {
    fn on_phase_complete(&self, completion: &PhaseCompletion) {
        for sink in &self.sinks {
            sink.on_phase_complete(completion);
        }
    }
}

/// How the timer should move on after a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Proceed on its own once the delay has passed
    ProceedAfter(Duration),
    /// Wait for the host to dismiss the alarm
    AwaitDismissal,
}

/// Bridges the timer and the user's notification preferences.
///
/// The continuation mode lives in a settings channel owned by the host and is
/// read at the moment an interval runs out.
#[derive(Debug, Clone)]
pub struct NotificationCoordinator {
    sink: Arc<dyn NotificationSink>,
    mode: watch::Receiver<ContinuationMode>,
    feedback_delay: Duration,
}

impl NotificationCoordinator {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        mode: watch::Receiver<ContinuationMode>,
        feedback_delay: Duration,
    ) -> Self {
        Self {
            sink,
            mode,
            feedback_delay,
        }
    }

    /// Coordinator with a fixed mode and no side effects
    pub fn silent(mode: ContinuationMode) -> Self {
        // watch::channel keeps the value readable after the sender is dropped
        let (_, rx) = watch::channel(mode);
        Self::new(Arc::new(NoopSink), rx, DEFAULT_FEEDBACK_DELAY)
    }

    /// Current continuation mode setting
    pub fn mode(&self) -> ContinuationMode {
        *self.mode.borrow()
    }

    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    /// Fire completion feedback and decide how the timer continues
    pub fn on_phase_complete(&self, completion: &PhaseCompletion) -> Continuation {
        self.sink.on_phase_complete(completion);

        let continuation = match completion.mode {
            ContinuationMode::Auto => Continuation::ProceedAfter(self.feedback_delay),
            ContinuationMode::Manual => Continuation::AwaitDismissal,
        };
        debug!(
            "Completion of {:?} lap {} handled: {:?}",
            completion.completed, completion.lap, continuation
        );
        continuation
    }
}
