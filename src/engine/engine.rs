//! Interval timer state machine.
//!
//! The engine is pure: it owns the current phase, lap and remaining time but
//! performs no I/O and spawns nothing. A driver feeds it commands and clock
//! signals, asks [`TimerEngine::clock_demand`] whether a countdown should be
//! running, and publishes [`TimerEngine::snapshot`] after every mutation.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> (Resting) -> Running -> ... -> Running -> Stopped
//!              |  ^         |  ^
//!              v  |         v  |
//!             Paused       Paused
//!
//! Running/Resting --(elapsed, manual)--> AlarmActive --(dismiss)--> next
//! Running/Resting --(elapsed, auto)----> completing  --(proceed)--> next
//! ```
//!
//! Every countdown run is tagged with an epoch. Ticks, completions and
//! proceed signals carrying an older epoch are ignored, so a clock that was
//! cancelled late can never move the state.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::rescale::rescale_remaining;
use crate::{
    error::{Command, CommandError, CommandResult, Outcome},
    state::{Configuration, ContinuationMode, Interval, TimerPhase, TimerState},
};

/// What happens once the interval that just finished is left behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextStep {
    /// Rest interval of the same lap
    Rest,
    /// Work interval of the given lap
    Work { lap: u32 },
    /// Last lap done; back to stopped
    Finish,
}

impl NextStep {
    /// Phase the timer will be in after taking this step
    pub fn phase(&self) -> TimerPhase {
        match self {
            NextStep::Rest => TimerPhase::Resting,
            NextStep::Work { .. } => TimerPhase::Running,
            NextStep::Finish => TimerPhase::Stopped,
        }
    }
}

/// Emitted when a countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseCompletion {
    /// Interval that just ran out
    pub completed: Interval,
    /// Lap the completed interval belonged to
    pub lap: u32,
    /// Step the timer will take when it proceeds, as of now
    pub next: NextStep,
    /// Mode captured at completion time
    pub mode: ContinuationMode,
    /// Token that a later proceed signal must present
    pub epoch: u64,
}

impl PhaseCompletion {
    pub fn completed_phase(&self) -> TimerPhase {
        self.completed.active_phase()
    }

    /// Whether this completion ends the session
    pub fn is_final(&self) -> bool {
        self.next == NextStep::Finish
    }
}

/// A countdown the driver should have running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDemand {
    pub epoch: u64,
    pub duration: Duration,
}

/// Internal activity. Richer than [`TimerPhase`]: a paused timer remembers
/// which interval to resume and whether that interval had already run out,
/// and a finished interval remembers how it is waiting to move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Idle,
    Counting(Interval),
    /// `completed` is set when the pause landed inside an auto-mode feedback
    /// delay; resuming then takes the pending step instead of counting again.
    Suspended { resume_target: Interval, completed: bool },
    Completing { completed: Interval, mode: ContinuationMode },
}

/// Core timer engine
#[derive(Debug, Clone)]
pub struct TimerEngine {
    configuration: Configuration,
    activity: Activity,
    time_remaining: Duration,
    current_lap: u32,
    epoch: u64,
}

impl TimerEngine {
    /// Create a stopped engine previewing `configuration`
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            activity: Activity::Idle,
            time_remaining: configuration.work_duration(),
            current_lap: 1,
            epoch: 0,
        }
    }

    // Queries

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn phase(&self) -> TimerPhase {
        match self.activity {
            Activity::Idle => TimerPhase::Stopped,
            Activity::Counting(interval) => interval.active_phase(),
            Activity::Suspended { .. } => TimerPhase::Paused,
            Activity::Completing {
                mode: ContinuationMode::Manual,
                ..
            } => TimerPhase::AlarmActive,
            Activity::Completing {
                completed,
                mode: ContinuationMode::Auto,
            } => completed.active_phase(),
        }
    }

    /// Interval the remaining time refers to. A stopped engine previews work.
    pub fn current_interval(&self) -> Interval {
        match self.activity {
            Activity::Idle => Interval::Work,
            Activity::Counting(interval) => interval,
            Activity::Suspended { resume_target, .. } => resume_target,
            Activity::Completing { completed, .. } => completed,
        }
    }

    /// Full length of the current interval under the active configuration
    pub fn interval_duration(&self) -> Duration {
        self.configuration.duration_of(self.current_interval())
    }

    /// The step a pending completion will take, computed against the
    /// configuration as it is right now
    pub fn pending_step(&self) -> Option<NextStep> {
        match self.activity {
            Activity::Completing {
                completed: interval,
                ..
            }
            | Activity::Suspended {
                resume_target: interval,
                completed: true,
            } => Some(self.next_step(interval)),
            _ => None,
        }
    }

    /// The countdown that should be running, if any
    pub fn clock_demand(&self) -> Option<ClockDemand> {
        match self.activity {
            Activity::Counting(_) => Some(ClockDemand {
                epoch: self.epoch,
                duration: self.time_remaining,
            }),
            _ => None,
        }
    }

    /// Build an immutable snapshot for publication
    pub fn snapshot(&self) -> TimerState {
        TimerState {
            phase: self.phase(),
            time_remaining: self.time_remaining,
            current_lap: self.current_lap,
            total_laps: self.configuration.laps(),
            configuration: self.configuration,
        }
    }

    // Commands

    /// Begin a session. Only valid while stopped.
    pub fn start(&mut self, configuration: Configuration) -> CommandResult {
        if self.activity != Activity::Idle {
            return Err(self.reject(Command::Start));
        }

        self.configuration = configuration;
        self.current_lap = 1;
        self.enter_interval(Interval::Work);
        info!("Timer started: {}", self.configuration);
        Ok(Outcome::Applied)
    }

    pub fn pause(&mut self) -> CommandResult {
        let (interval, completed) = match self.activity {
            Activity::Counting(interval) => (interval, false),
            Activity::Completing {
                completed: interval,
                mode: ContinuationMode::Auto,
            } => (interval, true),
            Activity::Suspended { .. } => return Ok(Outcome::Unchanged),
            Activity::Idle
            | Activity::Completing {
                mode: ContinuationMode::Manual,
                ..
            } => return Err(self.reject(Command::Pause)),
        };

        self.activity = Activity::Suspended {
            resume_target: interval,
            completed,
        };
        self.bump_epoch();
        info!(
            "Timer paused in {:?} interval with {:?} remaining",
            interval, self.time_remaining
        );
        Ok(Outcome::Applied)
    }

    pub fn resume(&mut self) -> CommandResult {
        match self.activity {
            Activity::Suspended {
                resume_target,
                completed: false,
            } => {
                self.activity = Activity::Counting(resume_target);
                self.bump_epoch();
                info!(
                    "Timer resumed in {:?} interval with {:?} remaining",
                    resume_target, self.time_remaining
                );
                Ok(Outcome::Applied)
            }
            // Already reported as complete; move on without a second completion
            Activity::Suspended {
                resume_target,
                completed: true,
            } => {
                let step = self.advance(resume_target);
                info!("Timer resumed after a finished {:?} interval: {:?}", resume_target, step);
                Ok(Outcome::Applied)
            }
            Activity::Counting(_)
            | Activity::Completing {
                mode: ContinuationMode::Auto,
                ..
            } => Ok(Outcome::Unchanged),
            Activity::Idle
            | Activity::Completing {
                mode: ContinuationMode::Manual,
                ..
            } => Err(self.reject(Command::Resume)),
        }
    }

    /// Return to the stopped preview of the current configuration
    pub fn stop(&mut self) -> Outcome {
        let preview = TimerState::stopped(self.configuration);
        if self.activity == Activity::Idle && self.snapshot() == preview {
            return Outcome::Unchanged;
        }

        self.reset_to_preview();
        info!("Timer stopped");
        Outcome::Applied
    }

    /// Leave `AlarmActive` by taking the pending step
    pub fn dismiss_alarm(&mut self) -> CommandResult {
        match self.activity {
            Activity::Completing {
                completed,
                mode: ContinuationMode::Manual,
            } => {
                let step = self.advance(completed);
                info!("Alarm dismissed, moving on: {:?}", step);
                Ok(Outcome::Applied)
            }
            _ => Err(self.reject(Command::DismissAlarm)),
        }
    }

    /// Swap in a new configuration.
    ///
    /// While stopped the preview is simply rebuilt. Otherwise the remaining
    /// time is rescaled so the same fraction of the current interval is left,
    /// and the lap is clamped to the new lap count.
    pub fn update_configuration(&mut self, configuration: Configuration) -> Outcome {
        if configuration == self.configuration {
            return Outcome::Unchanged;
        }

        if self.activity == Activity::Idle {
            self.configuration = configuration;
            self.reset_to_preview();
            info!("Configuration replaced while stopped: {}", configuration);
            return Outcome::Applied;
        }

        let interval = self.current_interval();
        let old_total = self.configuration.duration_of(interval);
        let new_total = configuration.duration_of(interval);
        let rescaled = rescale_remaining(self.time_remaining, old_total, new_total);

        self.configuration = configuration;
        self.time_remaining = rescaled;
        self.current_lap = configuration.laps().clamp_lap(self.current_lap);

        // A live countdown has to restart against the rescaled remainder
        if matches!(self.activity, Activity::Counting(_)) {
            self.bump_epoch();
        }

        info!(
            "Configuration updated mid-session: {} ({:?} interval now has {:?} remaining, lap {})",
            configuration, interval, rescaled, self.current_lap
        );
        Outcome::Applied
    }

    // Clock signals

    /// Record a tick from the countdown of run `epoch`.
    /// Returns `false` if the tick was stale and ignored.
    pub fn on_clock_tick(&mut self, epoch: u64, remaining: Duration) -> bool {
        if epoch != self.epoch || !matches!(self.activity, Activity::Counting(_)) {
            trace!("Ignoring stale tick from epoch {} (current {})", epoch, self.epoch);
            return false;
        }

        let limit = self.interval_duration();
        self.time_remaining = if remaining > limit {
            warn!("Tick reported {:?} remaining, above interval length {:?}", remaining, limit);
            limit
        } else {
            remaining
        };
        true
    }

    /// Handle the countdown of run `epoch` reaching zero.
    ///
    /// Parks the engine until [`proceed`](Self::proceed) (auto mode) or
    /// [`dismiss_alarm`](Self::dismiss_alarm) (manual mode) moves it on.
    pub fn on_interval_elapsed(&mut self, epoch: u64, mode: ContinuationMode) -> Option<PhaseCompletion> {
        let completed = match self.activity {
            Activity::Counting(interval) if epoch == self.epoch => interval,
            _ => {
                debug!("Ignoring stale completion from epoch {} (current {})", epoch, self.epoch);
                return None;
            }
        };

        self.time_remaining = Duration::ZERO;
        self.activity = Activity::Completing { completed, mode };
        self.bump_epoch();

        let completion = PhaseCompletion {
            completed,
            lap: self.current_lap,
            next: self.next_step(completed),
            mode,
            epoch: self.epoch,
        };
        info!(
            "{:?} interval of lap {} complete, next: {:?} ({} mode)",
            completed, completion.lap, completion.next, mode
        );
        Some(completion)
    }

    /// Continue after an auto-mode completion. Returns `false` if `epoch` no
    /// longer matches the pending completion.
    pub fn proceed(&mut self, epoch: u64) -> bool {
        match self.activity {
            Activity::Completing {
                completed,
                mode: ContinuationMode::Auto,
            } if epoch == self.epoch => {
                let step = self.advance(completed);
                debug!("Auto-continued to {:?}", step);
                true
            }
            _ => {
                debug!("Ignoring stale proceed for epoch {} (current {})", epoch, self.epoch);
                false
            }
        }
    }

    // Internal

    /// Rest follows work only when another lap comes after it; the final
    /// work interval of a bounded session ends the session directly.
    fn next_step(&self, completed: Interval) -> NextStep {
        let laps = self.configuration.laps();
        if !laps.has_lap_after(self.current_lap) {
            return NextStep::Finish;
        }

        if completed == Interval::Work && self.configuration.has_rest() {
            NextStep::Rest
        } else {
            NextStep::Work {
                lap: self.current_lap.saturating_add(1),
            }
        }
    }

    fn advance(&mut self, completed: Interval) -> NextStep {
        let step = self.next_step(completed);
        match step {
            NextStep::Rest => self.enter_interval(Interval::Rest),
            NextStep::Work { lap } => {
                self.current_lap = lap;
                self.enter_interval(Interval::Work);
            }
            NextStep::Finish => {
                info!("Session complete after {} laps", self.current_lap);
                self.reset_to_preview();
            }
        }
        step
    }

    fn enter_interval(&mut self, interval: Interval) {
        self.activity = Activity::Counting(interval);
        self.time_remaining = self.configuration.duration_of(interval);
        self.bump_epoch();
    }

    fn reset_to_preview(&mut self) {
        self.activity = Activity::Idle;
        self.time_remaining = self.configuration.work_duration();
        self.current_lap = 1;
        self.bump_epoch();
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn reject(&self, command: Command) -> CommandError {
        let phase = self.phase();
        warn!("Rejected {} while {}", command, phase);
        CommandError::InvalidPhase { command, phase }
    }
}
