//! Hard navigation
//!
//! Forced logouts end in a full navigation that discards every in-memory
//! view of the old session. The host decides what that means (reload a
//! webview, exit a screen stack); the session layer only names the target.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Targets a [`TracingNavigator`] remembers
pub const NAVIGATION_HISTORY_LIMIT: usize = 32;

/// Performs hard navigations on behalf of the session layer
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Navigator for headless hosts: logs the target and remembers the most
/// recent ones
#[derive(Debug, Default)]
pub struct TracingNavigator {
    history: Mutex<VecDeque<String>>,
}

impl TracingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent target
    pub fn last(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Remembered targets, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl Navigator for TracingNavigator {
    fn navigate(&self, target: &str) {
        tracing::info!(target_path = target, "Hard navigation");
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == NAVIGATION_HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(target.to_string());
    }
}
