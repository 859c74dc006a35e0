//! Cancellable countdown background task

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    runtime::Handle,
    sync::oneshot,
    task::JoinHandle,
    time::{interval_at, sleep_until, Instant, MissedTickBehavior},
};
use tracing::{debug, trace};

/// Default cadence for tick callbacks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// A countdown running on a background task.
///
/// Remaining time is always derived from a fixed deadline, so slow or skipped
/// ticks never accumulate drift. The clock knows nothing about laps or
/// phases; the timer restarts a fresh one for every interval.
#[derive(Debug)]
pub struct CountdownClock {
    deadline: Instant,
    cancel_tx: Option<oneshot::Sender<()>>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl CountdownClock {
    /// Start counting `duration` down on `runtime`.
    ///
    /// `on_tick` receives the remaining time every `tick_interval`;
    /// `on_complete` runs exactly once when the deadline is reached.
    pub fn start<T, C>(
        runtime: &Handle,
        duration: Duration,
        tick_interval: Duration,
        mut on_tick: T,
        on_complete: C,
    ) -> Self
    where
        T: FnMut(Duration) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let task_cancelled = Arc::clone(&cancelled);
        let tick_interval = tick_interval.max(Duration::from_millis(1));
        let started = Instant::now();
        let deadline = started + duration;

        debug!("Starting countdown of {:?}", duration);

        let handle = runtime.spawn(async move {
            let expiry = sleep_until(deadline);
            tokio::pin!(expiry);

            let mut ticker = interval_at(started + tick_interval, tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    // Fires on cancel() and when the clock is dropped
                    _ = &mut cancel_rx => {
                        trace!("Countdown cancelled");
                        return;
                    }

                    _ = &mut expiry => {
                        if !task_cancelled.load(Ordering::SeqCst) {
                            trace!("Countdown reached its deadline");
                            on_complete();
                        }
                        return;
                    }

                    _ = ticker.tick() => {
                        if task_cancelled.load(Ordering::SeqCst) {
                            return;
                        }
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if !remaining.is_zero() {
                            on_tick(remaining);
                        }
                    }
                }
            }
        });

        Self {
            deadline,
            cancel_tx: Some(cancel_tx),
            cancelled,
            handle,
        }
    }

    /// Stop the countdown. Safe to call any number of times.
    ///
    /// A callback already executing may still finish; no new one is started.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(tx) = self.cancel_tx.take() {
            // The task may already have finished and dropped its receiver
            let _ = tx.send(());
            debug!("Countdown cancel requested");
        }
    }

    /// Time left until the deadline, independent of tick cadence
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the countdown is still ticking
    pub fn is_running(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst) && !self.handle.is_finished()
    }
}

impl Drop for CountdownClock {
    fn drop(&mut self) {
        self.cancel();
    }
}
