//! Workout configuration: lap count plus work and rest durations

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Interval;

/// Highest finite lap count a configuration accepts
pub const MAX_LAPS: u32 = 99;
/// Shortest allowed work interval
pub const MIN_WORK_DURATION: Duration = Duration::from_secs(1);
/// Longest allowed work or rest interval
pub const MAX_INTERVAL_DURATION: Duration = Duration::from_secs(10 * 60);

/// Number of laps in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LapsRepr", into = "LapsRepr")]
pub enum Laps {
    /// A fixed number of laps, always within `1..=MAX_LAPS`
    Finite(u32),
    /// No lap ceiling; the session only ends when stopped
    Unbounded,
}

impl Laps {
    /// Build a finite lap count, coercing it into `1..=MAX_LAPS`
    pub fn finite(count: u32) -> Self {
        let clamped = count.clamp(1, MAX_LAPS);
        if clamped != count {
            debug!("Lap count {} coerced to {}", count, clamped);
        }
        Laps::Finite(clamped)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Laps::Unbounded)
    }

    /// Whether another lap follows `lap`
    pub fn has_lap_after(&self, lap: u32) -> bool {
        match self {
            Laps::Finite(total) => lap < *total,
            Laps::Unbounded => true,
        }
    }

    /// Clamp a lap index so it never exceeds a finite total
    pub fn clamp_lap(&self, lap: u32) -> u32 {
        match self {
            Laps::Finite(total) => lap.clamp(1, *total),
            Laps::Unbounded => lap.max(1),
        }
    }

    fn normalized(self) -> Self {
        match self {
            Laps::Finite(count) => Laps::finite(count),
            Laps::Unbounded => Laps::Unbounded,
        }
    }
}

impl fmt::Display for Laps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Laps::Finite(count) => write!(f, "{}", count),
            Laps::Unbounded => write!(f, "unbounded"),
        }
    }
}

impl FromStr for Laps {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unbounded" | "infinite" | "inf" => Ok(Laps::Unbounded),
            other => other
                .parse::<u32>()
                .map(Laps::finite)
                .map_err(|e| format!("invalid lap count '{}': {}", s, e)),
        }
    }
}

/// Wire form of [`Laps`]: a bare number or the keyword `"unbounded"`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LapsRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<LapsRepr> for Laps {
    type Error = String;

    fn try_from(repr: LapsRepr) -> Result<Self, Self::Error> {
        match repr {
            LapsRepr::Count(count) => Ok(Laps::finite(count)),
            LapsRepr::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl From<Laps> for LapsRepr {
    fn from(laps: Laps) -> Self {
        match laps {
            Laps::Finite(count) => LapsRepr::Count(count),
            Laps::Unbounded => LapsRepr::Keyword("unbounded".to_string()),
        }
    }
}

/// Immutable description of a workout.
///
/// Values are normalized on construction: out-of-range inputs are coerced to
/// the nearest bound, never rejected. Changing a running session means
/// building a new `Configuration` and handing it to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawConfiguration", into = "RawConfiguration")]
pub struct Configuration {
    laps: Laps,
    work_duration: Duration,
    rest_duration: Duration,
}

impl Configuration {
    /// Create a normalized configuration
    pub fn new(laps: Laps, work_duration: Duration, rest_duration: Duration) -> Self {
        let work = work_duration.clamp(MIN_WORK_DURATION, MAX_INTERVAL_DURATION);
        let rest = rest_duration.min(MAX_INTERVAL_DURATION);
        if work != work_duration || rest != rest_duration {
            debug!(
                "Configuration durations coerced: work {:?} -> {:?}, rest {:?} -> {:?}",
                work_duration, work, rest_duration, rest
            );
        }

        Self {
            laps: laps.normalized(),
            work_duration: work,
            rest_duration: rest,
        }
    }

    /// Convenience constructor taking whole seconds
    pub fn from_secs(laps: Laps, work_secs: u64, rest_secs: u64) -> Self {
        Self::new(
            laps,
            Duration::from_secs(work_secs),
            Duration::from_secs(rest_secs),
        )
    }

    pub fn laps(&self) -> Laps {
        self.laps
    }

    pub fn work_duration(&self) -> Duration {
        self.work_duration
    }

    pub fn rest_duration(&self) -> Duration {
        self.rest_duration
    }

    /// Whether a rest phase is ever entered
    pub fn has_rest(&self) -> bool {
        !self.rest_duration.is_zero()
    }

    /// Full length of the given interval kind
    pub fn duration_of(&self, interval: Interval) -> Duration {
        match interval {
            Interval::Work => self.work_duration,
            Interval::Rest => self.rest_duration,
        }
    }
}

impl Default for Configuration {
    /// Eight laps of 20 seconds work and 10 seconds rest
    fn default() -> Self {
        Self::from_secs(Laps::Finite(8), 20, 10)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} laps, {}s work, {}s rest",
            self.laps,
            self.work_duration.as_secs(),
            self.rest_duration.as_secs()
        )
    }
}

/// JSON shape of a configuration
#[derive(Serialize, Deserialize)]
struct RawConfiguration {
    laps: Laps,
    work_secs: u64,
    #[serde(default)]
    rest_secs: u64,
}

impl From<RawConfiguration> for Configuration {
    fn from(raw: RawConfiguration) -> Self {
        Configuration::from_secs(raw.laps, raw.work_secs, raw.rest_secs)
    }
}

impl From<Configuration> for RawConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            laps: config.laps,
            work_secs: config.work_duration.as_secs(),
            rest_secs: config.rest_duration.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_values_are_coerced() {
        let config = Configuration::new(
            Laps::Finite(0),
            Duration::from_secs(3600),
            Duration::from_secs(900),
        );
        assert_eq!(config.laps(), Laps::Finite(1));
        assert_eq!(config.work_duration(), MAX_INTERVAL_DURATION);
        assert_eq!(config.rest_duration(), MAX_INTERVAL_DURATION);

        let config = Configuration::new(Laps::Finite(500), Duration::ZERO, Duration::ZERO);
        assert_eq!(config.laps(), Laps::Finite(MAX_LAPS));
        assert_eq!(config.work_duration(), MIN_WORK_DURATION);
        assert!(!config.has_rest());
    }

    #[test]
    fn laps_parse_from_cli_text() {
        assert_eq!("unbounded".parse::<Laps>(), Ok(Laps::Unbounded));
        assert_eq!(" INF ".parse::<Laps>(), Ok(Laps::Unbounded));
        assert_eq!("4".parse::<Laps>(), Ok(Laps::Finite(4)));
        assert_eq!("0".parse::<Laps>(), Ok(Laps::Finite(1)));
        assert!("many".parse::<Laps>().is_err());
    }

    #[test]
    fn unbounded_always_has_another_lap() {
        assert!(Laps::Unbounded.has_lap_after(u32::MAX - 1));
        assert!(Laps::Finite(3).has_lap_after(2));
        assert!(!Laps::Finite(3).has_lap_after(3));
        assert_eq!(Laps::Finite(3).clamp_lap(7), 3);
        assert_eq!(Laps::Unbounded.clamp_lap(7), 7);
    }

    #[test]
    fn json_shape_normalizes_on_the_way_in() {
        let config: Configuration =
            serde_json::from_str(r#"{"laps": "unbounded", "work_secs": 900}"#).unwrap();
        assert_eq!(config.laps(), Laps::Unbounded);
        assert_eq!(config.work_duration(), MAX_INTERVAL_DURATION);
        assert_eq!(config.rest_duration(), Duration::ZERO);

        let json = serde_json::to_value(Configuration::from_secs(Laps::Finite(2), 5, 2)).unwrap();
        assert_eq!(json["laps"], 2);
        assert_eq!(json["work_secs"], 5);
        assert_eq!(json["rest_secs"], 2);
    }
}
