//! Continuation mode setting

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the timer moves on once an interval runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContinuationMode {
    /// Advance automatically after a short feedback delay
    #[default]
    Auto,
    /// Hold in `AlarmActive` until the alarm is dismissed
    Manual,
}

impl fmt::Display for ContinuationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuationMode::Auto => f.write_str("auto"),
            ContinuationMode::Manual => f.write_str("manual"),
        }
    }
}
