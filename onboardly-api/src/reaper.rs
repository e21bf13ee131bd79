//! Background purge of expired sessions
//!
//! Expired sessions are already ignored at lookup time; the reaper only
//! keeps the sessions table from growing without bound.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use onboardly_shared::store::SessionStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodic expired-session cleanup
pub struct SessionReaper {
    sessions: Arc<dyn SessionStore>,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl SessionReaper {
    pub fn new(sessions: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self {
            sessions,
            interval,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops the reaper after its current pass
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs one purge; returns how many sessions were removed
    pub async fn reap_once(&self) -> u64 {
        match self.sessions.purge_expired(Utc::now()).await {
            Ok(0) => 0,
            Ok(removed) => {
                tracing::info!(removed, "Purged expired sessions");
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to purge expired sessions");
                0
            }
        }
    }

    /// Loops until the shutdown token is cancelled
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Session reaper starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = ticker.tick() => {
                    self.reap_once().await;
                }
            }
        }

        tracing::info!("Session reaper stopped");
    }

    /// Spawns [`SessionReaper::run`] on the runtime
    pub fn spawn(self) -> (CancellationToken, JoinHandle<()>) {
        let token = self.shutdown_token();
        (token, tokio::spawn(self.run()))
    }
}
