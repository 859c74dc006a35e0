//! Completion feedback sinks: vibration, sound and screen flash
//!
//! Each sink either runs a host-provided command line or, without one, just
//! logs the feedback it would have produced. Commands run on a spawned task
//! so a slow device never holds up the timer.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::{process::Command, runtime::Handle};
use tracing::{debug, info, warn};

use super::notification::{CombinedSink, NoopSink, NotificationSink};
use crate::engine::PhaseCompletion;

/// Kind of feedback a sink produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Vibration,
    Sound,
    Flash,
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackKind::Vibration => f.write_str("vibration"),
            FeedbackKind::Sound => f.write_str("sound"),
            FeedbackKind::Flash => f.write_str("flash"),
        }
    }
}

/// Which feedback the host wants on completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStyle {
    None,
    Vibrate,
    #[default]
    Sound,
    Flash,
    All,
}

impl NotificationStyle {
    /// Feedback kinds this style turns on
    pub fn kinds(&self) -> &'static [FeedbackKind] {
        match self {
            NotificationStyle::None => &[],
            NotificationStyle::Vibrate => &[FeedbackKind::Vibration],
            NotificationStyle::Sound => &[FeedbackKind::Sound],
            NotificationStyle::Flash => &[FeedbackKind::Flash],
            NotificationStyle::All => &[
                FeedbackKind::Vibration,
                FeedbackKind::Sound,
                FeedbackKind::Flash,
            ],
        }
    }
}

/// An external program invoked on completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl FromStr for FeedbackCommand {
    type Err = String;

    /// Split a command line on whitespace; no shell quoting is applied
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| "feedback command must not be empty".to_string())?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl FeedbackCommand {
    /// Run the command with completion details in its environment
    pub async fn run(&self, completion: &PhaseCompletion) -> Result<(), String> {
        debug!("Running feedback command {}", self.program);

        let output = Command::new(&self.program)
            .args(&self.args)
            .env("INTERVAL_TIMER_COMPLETED", completion.completed_phase().to_string())
            .env("INTERVAL_TIMER_NEXT", completion.next.phase().to_string())
            .env("INTERVAL_TIMER_LAP", completion.lap.to_string())
            .env("INTERVAL_TIMER_FINAL", if completion.is_final() { "1" } else { "0" })
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} failed: {}", self.program, stderr));
        }

        Ok(())
    }
}

/// Sink producing one kind of feedback
#[derive(Debug, Clone)]
pub struct FeedbackSink {
    kind: FeedbackKind,
    command: Option<FeedbackCommand>,
}

impl FeedbackSink {
    pub fn new(kind: FeedbackKind, command: Option<FeedbackCommand>) -> Self {
        Self { kind, command }
    }

    pub fn kind(&self) -> FeedbackKind {
        self.kind
    }
}

impl NotificationSink for FeedbackSink {
    fn on_phase_complete(&self, completion: &PhaseCompletion) {
        let Some(command) = self.command.clone() else {
            info!(
                "{} feedback: {} of lap {} done{}",
                self.kind,
                completion.completed_phase(),
                completion.lap,
                if completion.is_final() { ", session complete" } else { "" }
            );
            return;
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, skipping {} feedback command", self.kind);
            return;
        };

        let kind = self.kind;
        let completion = *completion;
        runtime.spawn(async move {
            if let Err(e) = command.run(&completion).await {
                warn!("{} feedback failed: {}", kind, e);
            }
        });
    }
}

/// Commands configured for each feedback kind
#[derive(Debug, Clone, Default)]
pub struct FeedbackCommands {
    pub vibrate: Option<FeedbackCommand>,
    pub sound: Option<FeedbackCommand>,
    pub flash: Option<FeedbackCommand>,
}

impl FeedbackCommands {
    fn for_kind(&self, kind: FeedbackKind) -> Option<FeedbackCommand> {
        match kind {
            FeedbackKind::Vibration => self.vibrate.clone(),
            FeedbackKind::Sound => self.sound.clone(),
            FeedbackKind::Flash => self.flash.clone(),
        }
    }
}

/// Build the sink matching the host's notification style
pub fn build_sink(style: NotificationStyle, commands: &FeedbackCommands) -> Arc<dyn NotificationSink> {
    let mut sinks: Vec<Arc<dyn NotificationSink>> = style
        .kinds()
        .iter()
        .map(|&kind| Arc::new(FeedbackSink::new(kind, commands.for_kind(kind))) as Arc<dyn NotificationSink>)
        .collect();

    match sinks.len() {
        0 => Arc::new(NoopSink),
        1 => sinks.remove(0),
        _ => Arc::new(CombinedSink::new(sinks)),
    }
}
