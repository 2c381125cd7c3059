//! Analytics polling.
//!
//! Independent of the commentary cadence and of playback state: every tick
//! fetches the full snapshot and replaces the previous one wholesale
//! (last-write-wins). Poll failures keep the old snapshot and are
//! log-suppressed after a few consecutive misses.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};

use curb_models::{AnalyticsResponse, TimeRange};

use crate::api::CommentaryApi;
use crate::config::WatchConfig;

/// State tracker for repeated operations that may fail intermittently.
///
/// Suppresses log spam once an operation has failed more than
/// `max_logged_failures` times in a row.
#[derive(Debug, Default)]
pub struct FailureTracker {
    consecutive_failures: u32,
    max_logged_failures: u32,
    suppressed: bool,
}

impl FailureTracker {
    pub fn new(max_logged_failures: u32) -> Self {
        Self {
            consecutive_failures: 0,
            max_logged_failures,
            suppressed: false,
        }
    }

    /// Record a successful operation (resets failure count).
    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 && self.suppressed {
            debug!(
                "operation recovered after {} consecutive failures",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.suppressed = false;
    }

    /// Record a failed operation.
    ///
    /// Returns `true` if this failure should be logged (not suppressed).
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;

        if self.consecutive_failures <= self.max_logged_failures {
            true
        } else if self.consecutive_failures == self.max_logged_failures + 1 {
            self.suppressed = true;
            warn!(
                "suppressing further failure logs after {} consecutive failures",
                self.max_logged_failures
            );
            false
        } else {
            false
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures
    }
}

/// Fixed-cadence poller keeping a shared analytics snapshot fresh.
pub struct AnalyticsPoller<A: CommentaryApi> {
    api: Arc<A>,
    config: WatchConfig,
    snapshot: Arc<RwLock<AnalyticsResponse>>,
}

impl<A: CommentaryApi> AnalyticsPoller<A> {
    pub fn new(api: Arc<A>, config: WatchConfig) -> Self {
        Self {
            api,
            config,
            snapshot: Arc::new(RwLock::new(AnalyticsResponse::default())),
        }
    }

    /// Handle to the shared snapshot.
    pub fn snapshot(&self) -> Arc<RwLock<AnalyticsResponse>> {
        Arc::clone(&self.snapshot)
    }

    /// Poll until shutdown. Runs regardless of playback state.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.analytics_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut failures = FailureTracker::new(3);
        let prompt = self.config.user_prompt.clone();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    match self
                        .api
                        .fetch_analytics(prompt.as_deref(), TimeRange::All)
                        .await
                    {
                        Ok(snapshot) => {
                            failures.record_success();
                            debug!(total = snapshot.total_commentaries, "analytics refreshed");
                            // Whole-snapshot replacement: last write wins.
                            *self.snapshot.write().await = snapshot;
                        }
                        Err(e) => {
                            if failures.record_failure() {
                                warn!("analytics poll failed: {}", e);
                            }
                        }
                    }
                }
            }
        }
    }
}
