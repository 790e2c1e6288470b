//! Transient alerts (toasts)

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Alerts a [`TracingAlertSink`] remembers
pub const ALERT_HISTORY_LIMIT: usize = 64;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
}

/// Surfaces short-lived alerts to the user
pub trait AlertSink: Send + Sync {
    fn alert(&self, level: AlertLevel, message: &str);
}

/// Alert sink that writes alerts to the log and keeps the most recent ones
#[derive(Debug, Default)]
pub struct TracingAlertSink {
    shown: Mutex<VecDeque<(AlertLevel, String)>>,
}

impl TracingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(AlertLevel, String)> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl AlertSink for TracingAlertSink {
    fn alert(&self, level: AlertLevel, message: &str) {
        match level {
            AlertLevel::Info => tracing::info!("{}", message),
            AlertLevel::Warning => tracing::warn!("{}", message),
        }
        let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
        if shown.len() == ALERT_HISTORY_LIMIT {
            shown.pop_front();
        }
        shown.push_back((level, message.to_string()));
    }
}
