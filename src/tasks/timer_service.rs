//! Timer service: the engine, its countdown clock and its publisher wired
//! together behind a single lock

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::{
    runtime::{Handle, TryCurrentError},
    time::sleep,
};
use tracing::{debug, info, warn};

use super::countdown_clock::{CountdownClock, DEFAULT_TICK_INTERVAL};
use crate::{
    engine::{NextStep, TimerEngine},
    error::{CommandError, CommandResult, Outcome},
    services::{Continuation, NotificationCoordinator},
    state::{Configuration, ContinuationMode, StatePublisher, StateSubscription, TimerState},
};

/// Tunables for the service's background activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// How often the running countdown republishes its remaining time
    pub tick_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Handle to a running interval timer.
///
/// Commands are synchronous and never wait: each one takes the state lock,
/// mutates the engine, restarts or cancels the countdown as needed and
/// publishes the resulting snapshot before returning. Clock ticks and
/// auto-continue signals go through the same lock, so every published
/// snapshot follows from the one before it.
#[derive(Debug, Clone)]
pub struct TimerService {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    core: Mutex<Core>,
    publisher: Arc<StatePublisher>,
    coordinator: NotificationCoordinator,
    runtime: Handle,
    settings: ServiceSettings,
}

#[derive(Debug)]
struct Core {
    engine: TimerEngine,
    /// Running countdown and the epoch it was started for
    clock: Option<(u64, CountdownClock)>,
    shut_down: bool,
}

impl TimerService {
    /// Create a stopped timer on the current Tokio runtime.
    ///
    /// Fails when called outside a runtime; use [`with_runtime`](Self::with_runtime)
    /// to pass one explicitly.
    pub fn new(
        configuration: Configuration,
        coordinator: NotificationCoordinator,
        publisher: Arc<StatePublisher>,
        settings: ServiceSettings,
    ) -> Result<Self, TryCurrentError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(runtime, configuration, coordinator, publisher, settings))
    }

    pub fn with_runtime(
        runtime: Handle,
        configuration: Configuration,
        coordinator: NotificationCoordinator,
        publisher: Arc<StatePublisher>,
        settings: ServiceSettings,
    ) -> Self {
        let engine = TimerEngine::new(configuration);
        publisher.publish(engine.snapshot());
        info!("Timer service ready: {}", configuration);

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    engine,
                    clock: None,
                    shut_down: false,
                }),
                publisher,
                coordinator,
                runtime,
                settings,
            }),
        }
    }

    // Commands

    /// Start a session with `configuration`
    pub fn start(&self, configuration: Configuration) -> CommandResult {
        self.shared.execute(|engine| engine.start(configuration))
    }

    /// Start a session with whatever configuration is currently active
    pub fn start_current(&self) -> CommandResult {
        self.shared.execute(|engine| {
            let configuration = *engine.configuration();
            engine.start(configuration)
        })
    }

    pub fn pause(&self) -> CommandResult {
        self.shared.execute(TimerEngine::pause)
    }

    pub fn resume(&self) -> CommandResult {
        self.shared.execute(TimerEngine::resume)
    }

    pub fn stop(&self) -> CommandResult {
        self.shared.execute(|engine| Ok(engine.stop()))
    }

    pub fn dismiss_alarm(&self) -> CommandResult {
        self.shared.execute(TimerEngine::dismiss_alarm)
    }

    pub fn update_configuration(&self, configuration: Configuration) -> CommandResult {
        self.shared
            .execute(|engine| Ok(engine.update_configuration(configuration)))
    }

    /// Cancel the countdown, return to stopped and refuse further commands
    pub fn shutdown(&self) {
        let mut core = self.shared.lock_core();
        if core.shut_down {
            return;
        }

        core.shut_down = true;
        if let Some((_, mut clock)) = core.clock.take() {
            clock.cancel();
        }
        if core.engine.stop() == Outcome::Applied {
            self.shared.publisher.publish(core.engine.snapshot());
        }
        info!("Timer service shut down");
    }

    // Queries

    /// Latest published snapshot
    pub fn current(&self) -> TimerState {
        self.shared.publisher.current()
    }

    /// Observe snapshots, starting with the current one
    pub fn subscribe(&self) -> StateSubscription {
        self.shared.publisher.subscribe()
    }

    pub fn publisher(&self) -> Arc<StatePublisher> {
        Arc::clone(&self.shared.publisher)
    }

    pub fn configuration(&self) -> Configuration {
        *self.shared.lock_core().engine.configuration()
    }

    /// Step a waiting completion will take, if one is waiting
    pub fn pending_step(&self) -> Option<NextStep> {
        self.shared.lock_core().engine.pending_step()
    }

    /// Fraction of the current interval already elapsed
    pub fn progress(&self) -> f64 {
        let core = self.shared.lock_core();
        crate::engine::progress(core.engine.time_remaining(), core.engine.interval_duration())
    }

    pub fn mode(&self) -> ContinuationMode {
        self.shared.coordinator.mode()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock_core().shut_down
    }
}

impl Shared {
    fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Timer state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn execute<F>(self: &Arc<Self>, command: F) -> CommandResult
    where
        F: FnOnce(&mut TimerEngine) -> CommandResult,
    {
        let mut core = self.lock_core();
        if core.shut_down {
            return Err(CommandError::ShutDown);
        }

        // Rejected and unchanged commands leave the engine exactly as published
        let mut engine = core.engine.clone();
        Self::flush_clock(&core, &mut engine);
        let outcome = command(&mut engine)?;
        if outcome == Outcome::Applied {
            core.engine = engine;
            self.commit(&mut core);
        }
        Ok(outcome)
    }

    /// Catch `engine` up with time elapsed since the last tick
    fn flush_clock(core: &Core, engine: &mut TimerEngine) {
        if let Some((epoch, clock)) = &core.clock {
            engine.on_clock_tick(*epoch, clock.remaining());
        }
    }

    /// Bring the countdown in line with the engine, then publish
    fn commit(self: &Arc<Self>, core: &mut Core) {
        self.reconcile_clock(core);
        self.publisher.publish(core.engine.snapshot());
    }

    fn reconcile_clock(self: &Arc<Self>, core: &mut Core) {
        let demand = core.engine.clock_demand();
        let running = core.clock.as_ref().map(|(epoch, _)| *epoch);

        if let Some(demand) = demand {
            if running == Some(demand.epoch) {
                return;
            }
        }

        if let Some((epoch, mut clock)) = core.clock.take() {
            debug!("Cancelling countdown for epoch {}", epoch);
            clock.cancel();
        }

        if let Some(demand) = demand {
            let epoch = demand.epoch;
            let on_tick = {
                let shared = Arc::downgrade(self);
                move |remaining| {
                    if let Some(shared) = shared.upgrade() {
                        shared.handle_tick(epoch, remaining);
                    }
                }
            };
            let on_complete = {
                let shared = Arc::downgrade(self);
                move || {
                    if let Some(shared) = shared.upgrade() {
                        shared.handle_elapsed(epoch);
                    }
                }
            };

            debug!("Starting countdown of {:?} for epoch {}", demand.duration, epoch);
            let clock = CountdownClock::start(
                &self.runtime,
                demand.duration,
                self.settings.tick_interval,
                on_tick,
                on_complete,
            );
            core.clock = Some((epoch, clock));
        }
    }

    fn handle_tick(&self, epoch: u64, remaining: Duration) {
        let mut core = self.lock_core();
        if core.shut_down {
            return;
        }
        if core.engine.on_clock_tick(epoch, remaining) {
            self.publisher.publish(core.engine.snapshot());
        }
    }

    fn handle_elapsed(self: &Arc<Self>, epoch: u64) {
        let mut core = self.lock_core();
        if core.shut_down {
            return;
        }

        let mode = self.coordinator.mode();
        let Some(completion) = core.engine.on_interval_elapsed(epoch, mode) else {
            return;
        };
        self.commit(&mut core);

        match self.coordinator.on_phase_complete(&completion) {
            Continuation::ProceedAfter(delay) => self.schedule_proceed(completion.epoch, delay),
            Continuation::AwaitDismissal => {
                debug!("Alarm active, waiting for dismissal");
            }
        }
    }

    fn schedule_proceed(self: &Arc<Self>, epoch: u64, delay: Duration) {
        let shared: Weak<Shared> = Arc::downgrade(self);
        self.runtime.spawn(async move {
            sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.handle_proceed(epoch);
            }
        });
    }

    fn handle_proceed(self: &Arc<Self>, epoch: u64) {
        let mut core = self.lock_core();
        if core.shut_down {
            return;
        }
        if core.engine.proceed(epoch) {
            self.commit(&mut core);
        }
    }
}
