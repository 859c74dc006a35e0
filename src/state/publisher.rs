//! Broadcast of timer snapshots to any number of observers

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{trace, warn};

use super::TimerState;

/// Snapshots buffered per subscriber before it starts lagging
pub const DEFAULT_CAPACITY: usize = 256;

/// Holds the latest [`TimerState`] and fans every new one out to subscribers.
///
/// Publishing never waits on subscribers. A subscriber that falls more than
/// the channel capacity behind skips ahead to the oldest retained snapshot.
#[derive(Debug)]
pub struct StatePublisher {
    latest: Mutex<TimerState>,
    tx: broadcast::Sender<TimerState>,
}

impl StatePublisher {
    pub fn new(initial: TimerState) -> Self {
        Self::with_capacity(initial, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: TimerState, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: Mutex::new(initial),
            tx,
        }
    }

    /// Replace the latest snapshot and hand it to every subscriber
    pub fn publish(&self, state: TimerState) {
        let mut latest = self.lock_latest();
        *latest = state.clone();
        // An error only means nobody is listening right now
        if self.tx.send(state).is_err() {
            trace!("Published timer state with no subscribers");
        }
    }

    /// The most recently published snapshot
    pub fn current(&self) -> TimerState {
        self.lock_latest().clone()
    }

    /// Subscribe to snapshots, starting with the current one
    pub fn subscribe(&self) -> StateSubscription {
        // Holding the lock keeps a concurrent publish from landing between
        // reading the current value and attaching the receiver.
        let latest = self.lock_latest();
        StateSubscription {
            pending: Some(latest.clone()),
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn lock_latest(&self) -> MutexGuard<'_, TimerState> {
        self.latest.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Timer state publisher lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// A subscriber's view of the published snapshots
#[derive(Debug)]
pub struct StateSubscription {
    pending: Option<TimerState>,
    rx: broadcast::Receiver<TimerState>,
}

impl StateSubscription {
    /// Wait for the next snapshot. Returns `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<TimerState> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }

        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Timer state subscriber lagged, skipped {} snapshots", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next snapshot if one is already available
    pub fn try_next(&mut self) -> Option<TimerState> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }

        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Timer state subscriber lagged, skipped {} snapshots", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Adapt the subscription into a [`Stream`] of snapshots
    pub fn into_stream(self) -> impl Stream<Item = TimerState> + Send + 'static {
        stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|state| (state, subscription))
        })
    }
}
