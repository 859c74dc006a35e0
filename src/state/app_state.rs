//! Host application state shared by the HTTP handlers

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use super::ContinuationMode;
use crate::{error::CommandResult, tasks::TimerService};

/// State the daemon shares between its endpoints
#[derive(Debug)]
pub struct AppState {
    /// The interval timer being driven
    pub timer: TimerService,
    /// Continuation mode setting read by the timer on every completion
    pub mode_tx: watch::Sender<ContinuationMode>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(
        timer: TimerService,
        mode_tx: watch::Sender<ContinuationMode>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            timer,
            mode_tx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a timer command and remember it if it was accepted
    pub fn run_command<F>(&self, action: &str, command: F) -> CommandResult
    where
        F: FnOnce(&TimerService) -> CommandResult,
    {
        let result = command(&self.timer);
        match &result {
            Ok(outcome) => {
                info!("{} request handled: {:?}", action, outcome);
                self.record_action(action);
            }
            Err(e) => warn!("{} request rejected: {}", action, e),
        }
        result
    }

    /// Current continuation mode
    pub fn mode(&self) -> ContinuationMode {
        *self.mode_tx.borrow()
    }

    /// Change the continuation mode, returning the previous one
    pub fn set_mode(&self, mode: ContinuationMode) -> ContinuationMode {
        let previous = self.mode_tx.send_replace(mode);
        if previous != mode {
            info!("Continuation mode changed from {} to {}", previous, mode);
            self.record_action(&format!("mode-{}", mode));
        }
        previous
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
