//! Published timer snapshot types

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use super::{Configuration, Laps};

/// Externally visible phase of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Stopped,
    /// Work interval active
    Running,
    /// Rest interval active
    Resting,
    /// Suspended by the user; the interval kind is not exposed
    Paused,
    /// Interval finished in manual mode, waiting to be dismissed
    AlarmActive,
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerPhase::Stopped => "stopped",
            TimerPhase::Running => "running",
            TimerPhase::Resting => "resting",
            TimerPhase::Paused => "paused",
            TimerPhase::AlarmActive => "alarm_active",
        };
        f.write_str(name)
    }
}

/// The two kinds of interval a lap is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Work,
    Rest,
}

impl Interval {
    /// Phase shown while this interval counts down
    pub fn active_phase(self) -> TimerPhase {
        match self {
            Interval::Work => TimerPhase::Running,
            Interval::Rest => TimerPhase::Resting,
        }
    }
}

/// Immutable snapshot of the timer, produced on every engine mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "TimerStateView")]
pub struct TimerState {
    pub phase: TimerPhase,
    /// Remaining time in the current interval, never negative
    pub time_remaining: Duration,
    pub current_lap: u32,
    pub total_laps: Laps,
    /// The configuration this snapshot is consistent with
    pub configuration: Configuration,
}

impl TimerState {
    /// The idle preview of what starting `configuration` will do
    pub fn stopped(configuration: Configuration) -> Self {
        Self {
            phase: TimerPhase::Stopped,
            time_remaining: configuration.work_duration(),
            current_lap: 1,
            total_laps: configuration.laps(),
            configuration,
        }
    }

    /// Remaining time rounded up to whole seconds, as a display would show it
    pub fn display_seconds(&self) -> u64 {
        let secs = self.time_remaining.as_secs();
        if self.time_remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == TimerPhase::Stopped
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::stopped(Configuration::default())
    }
}

/// Serialized shape of [`TimerState`]
#[derive(Serialize)]
struct TimerStateView {
    phase: TimerPhase,
    time_remaining_ms: u64,
    time_remaining_secs: u64,
    current_lap: u32,
    total_laps: Laps,
    configuration: Configuration,
}

impl From<TimerState> for TimerStateView {
    fn from(state: TimerState) -> Self {
        Self {
            phase: state.phase,
            time_remaining_ms: u64::try_from(state.time_remaining.as_millis()).unwrap_or(u64::MAX),
            time_remaining_secs: state.display_seconds(),
            current_lap: state.current_lap,
            total_laps: state.total_laps,
            configuration: state.configuration,
        }
    }
}
