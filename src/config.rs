//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

use crate::{
    services::{FeedbackCommand, FeedbackCommands, NotificationStyle},
    state::{Configuration, ContinuationMode, Laps},
    tasks::ServiceSettings,
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "interval-timer")]
#[command(about = "A lap-based work/rest interval timer controlled over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Number of laps, or "unbounded"
    #[arg(short, long, default_value = "8")]
    pub laps: Laps,

    /// Work interval length in seconds
    #[arg(short, long, default_value = "20")]
    pub work: u64,

    /// Rest interval length in seconds (0 disables rest)
    #[arg(short, long, default_value = "10")]
    pub rest: u64,

    /// What happens when an interval runs out
    #[arg(short, long, value_enum, default_value_t = ContinuationMode::Auto)]
    pub mode: ContinuationMode,

    /// Completion feedback to produce
    #[arg(short, long, value_enum, default_value_t = NotificationStyle::Sound)]
    pub notify: NotificationStyle,

    /// Pause in auto mode between an interval ending and the next one starting
    #[arg(long, default_value = "1500")]
    pub feedback_delay_ms: u64,

    /// How often a running countdown publishes its remaining time
    #[arg(long, default_value = "100")]
    pub tick_ms: u64,

    /// Command run for vibration feedback
    #[arg(long)]
    pub vibrate_cmd: Option<FeedbackCommand>,

    /// Command run for sound feedback
    #[arg(long)]
    pub sound_cmd: Option<FeedbackCommand>,

    /// Command run for flash feedback
    #[arg(long)]
    pub flash_cmd: Option<FeedbackCommand>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Session configuration the timer starts with, clamped to valid ranges
    pub fn configuration(&self) -> Configuration {
        Configuration::from_secs(self.laps, self.work, self.rest)
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }

    /// Background settings for the timer service; the tick never drops below 10ms
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            tick_interval: Duration::from_millis(self.tick_ms.max(10)),
        }
    }

    pub fn feedback_commands(&self) -> FeedbackCommands {
        FeedbackCommands {
            vibrate: self.vibrate_cmd.clone(),
            sound: self.sound_cmd.clone(),
            flash: self.flash_cmd.clone(),
        }
    }
}
