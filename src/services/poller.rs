//! Notification poller
//!
//! Background task following the session signal:
//! - whenever the signed-in user or token changes, refetch the unseen
//!   warning and inbox counts
//! - every liveness interval while signed in, re-fetch the user and log out
//!   if the account was suspended
//!
//! A new generation (login or logout) abandons whatever is in flight and
//! restarts the interval. Fetch failures are logged and swallowed; the next
//! trigger is the retry.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use super::session::{Liveness, SessionContext};
use crate::config::PollerConfig;
use crate::models::SessionSignal;

/// Why polling for a generation stopped
enum Wake {
    /// Same session, new revision
    Refresh,
    /// Login or logout happened
    Restart,
    /// The session context is gone
    Closed,
}

/// Poller configuration and state
pub struct NotificationPoller {
    session: Arc<SessionContext>,
    interval: Duration,
    request_timeout: Duration,
}

impl NotificationPoller {
    pub fn new(session: Arc<SessionContext>, interval: Duration, request_timeout: Duration) -> Self {
        Self {
            session,
            interval,
            request_timeout,
        }
    }

    pub fn from_config(session: Arc<SessionContext>, config: &PollerConfig) -> Self {
        Self::new(session, config.liveness_interval(), config.request_timeout())
    }

    /// Start polling on the current runtime
    pub fn spawn(self) -> PollerHandle {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Starting notification poller"
        );
        PollerHandle {
            task: tokio::spawn(self.run()),
        }
    }

    async fn run(self) {
        let mut rx = self.session.subscribe();
        loop {
            let signal = *rx.borrow_and_update();
            if signal.authenticated {
                if let Wake::Closed = self.follow(&mut rx, signal.generation).await {
                    break;
                }
            } else if rx.changed().await.is_err() {
                break;
            }
        }
        tracing::debug!("Notification poller stopped");
    }

    /// Poll for one generation until it ends
    async fn follow(&self, rx: &mut watch::Receiver<SessionSignal>, generation: u64) -> Wake {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh = true;

        loop {
            let outcome = if refresh {
                refresh = false;
                tokio::select! {
                    changed = rx.changed() => wake(rx, generation, changed.is_ok()),
                    _ = self.refresh_counts(generation) => continue,
                }
            } else {
                tokio::select! {
                    changed = rx.changed() => wake(rx, generation, changed.is_ok()),
                    _ = ticker.tick() => {
                        tokio::select! {
                            changed = rx.changed() => wake(rx, generation, changed.is_ok()),
                            _ = self.check_liveness(generation) => continue,
                        }
                    }
                }
            };

            match outcome {
                Wake::Refresh => refresh = true,
                other => return other,
            }
        }
    }

    async fn refresh_counts(&self, generation: u64) {
        let (warnings, inbox) = tokio::join!(
            timeout(self.request_timeout, self.session.sync_warnings(generation)),
            timeout(self.request_timeout, self.session.sync_inbox(generation)),
        );

        match warnings {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!("Failed to fetch unseen warnings: {}", e),
            Err(_) => tracing::debug!("Timed out fetching unseen warnings"),
        }
        match inbox {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!("Failed to fetch unseen inbox messages: {}", e),
            Err(_) => tracing::debug!("Timed out fetching unseen inbox messages"),
        }
    }

    async fn check_liveness(&self, generation: u64) {
        match timeout(self.request_timeout, self.session.check_liveness(generation)).await {
            Ok(Ok(Liveness::Active)) => tracing::debug!("Liveness check passed"),
            Ok(Ok(Liveness::Suspended)) => tracing::info!("Liveness check found a suspended account"),
            Ok(Ok(Liveness::Stale)) => tracing::debug!("Discarded stale liveness result"),
            Ok(Err(e)) if e.is_auth_failure() => tracing::debug!("Liveness check ended the session: {}", e),
            Ok(Err(e)) => tracing::warn!("Liveness check failed: {}", e),
            Err(_) => tracing::warn!("Liveness check timed out"),
        }
    }
}

fn wake(rx: &mut watch::Receiver<SessionSignal>, generation: u64, open: bool) -> Wake {
    if !open {
        return Wake::Closed;
    }
    let signal = *rx.borrow_and_update();
    if signal.authenticated && signal.generation == generation {
        Wake::Refresh
    } else {
        Wake::Restart
    }
}

/// Handle to a running poller; dropping it stops the task
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop the poller and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
