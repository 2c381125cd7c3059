//! The watch session reducer and runtime.
//!
//! All session state — commentary log, route, error banner, in-flight flag —
//! is owned by one reducer consuming a single input stream: cadence ticks,
//! playback events, completed tick results, and user messages. Inference
//! submissions run as spawned tasks that report back through the same
//! stream, so completion order can never race the state.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use curb_models::{CommentaryEntry, CommentaryResponse, Route};

use crate::api::CommentaryApi;
use crate::config::WatchConfig;
use crate::sampler::FrameSource;

/// Playback surface events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    Ended,
}

/// Result of one submitted tick.
#[derive(Debug)]
pub enum TickResult {
    /// The endpoint answered with commentary.
    Commentary(CommentaryResponse),
    /// Transport failure, non-2xx, or undecodable body.
    Failed(String),
}

/// One input to the reducer.
#[derive(Debug)]
pub enum SessionInput {
    /// Commentary cadence fired.
    Tick,
    /// The playback surface changed state.
    Playback(PlaybackEvent),
    /// A previously submitted tick resolved.
    Completed(TickResult),
    /// The user typed a chat message.
    UserMessage(String),
}

/// What the runtime should do after applying an input.
#[derive(Debug, PartialEq, Eq)]
pub enum TickAction {
    None,
    /// Sample one frame and submit it.
    Sample,
}

/// Session state owned by the reducer.
#[derive(Debug)]
pub struct SessionState {
    /// Whether the playback surface is currently playing.
    pub playing: bool,
    /// In-flight guard: true while one submission is outstanding.
    pub awaiting_inference: bool,
    /// Append-only commentary log.
    pub log: Vec<CommentaryEntry>,
    /// Route extended by high-probability detections.
    pub route: Route,
    /// User-visible error banner from the last failed tick.
    pub last_error: Option<String>,
    /// Ticks dropped by the in-flight guard.
    pub dropped_ticks: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            playing: false,
            awaiting_inference: false,
            log: Vec::new(),
            route: Route::san_francisco(),
            last_error: None,
            dropped_ticks: 0,
        }
    }

    /// Apply one input and report what the runtime should do.
    pub fn apply(&mut self, input: SessionInput) -> TickAction {
        match input {
            SessionInput::Playback(event) => {
                // Idempotent: play-while-playing and pause-while-paused are no-ops.
                self.playing = matches!(event, PlaybackEvent::Play);
                debug!(playing = self.playing, "playback state changed");
                TickAction::None
            }

            SessionInput::Tick => {
                if !self.playing {
                    return TickAction::None;
                }
                if self.awaiting_inference {
                    // No queueing, no overlap: the tick is simply dropped.
                    self.dropped_ticks += 1;
                    debug!(dropped = self.dropped_ticks, "tick dropped, inference in flight");
                    return TickAction::None;
                }
                self.awaiting_inference = true;
                TickAction::Sample
            }

            SessionInput::Completed(result) => {
                self.awaiting_inference = false;
                match result {
                    TickResult::Commentary(response) => {
                        let probability = response.likeliness_of_homelessness;
                        self.last_error = None;
                        self.log.push(CommentaryEntry::Ai {
                            timestamp: response.timestamp.unwrap_or_else(Utc::now),
                            text: response.text,
                            homelessness_probability: probability,
                        });

                        // Threshold check is against this tick's own probability.
                        if Route::should_spawn(probability) {
                            if let Some(waypoint) = self.route.spawn_waypoint() {
                                info!(
                                    lat = waypoint.location.lat,
                                    lng = waypoint.location.lng,
                                    "waypoint spawned from detection"
                                );
                            }
                        }
                    }
                    TickResult::Failed(message) => {
                        // Failures never become chat entries.
                        warn!("commentary tick failed: {}", message);
                        self.last_error = Some(message);
                    }
                }
                TickAction::None
            }

            SessionInput::UserMessage(text) => {
                self.log.push(CommentaryEntry::user(text));
                TickAction::None
            }
        }
    }

    /// AI entries currently in the log.
    pub fn ai_entry_count(&self) -> usize {
        self.log.iter().filter(|e| e.is_ai()).count()
    }
}

/// Session runtime: wires the interval, the playback events, and the
/// spawned submissions into the reducer.
pub struct Session<A: CommentaryApi> {
    api: Arc<A>,
    config: WatchConfig,
    state: SessionState,
}

impl<A: CommentaryApi> Session<A> {
    pub fn new(api: Arc<A>, config: WatchConfig) -> Self {
        Self {
            api,
            config,
            state: SessionState::new(),
        }
    }

    /// Run until shutdown; returns the final session state.
    ///
    /// Stopping playback suspends future ticks but does not cancel an
    /// in-flight submission — a late result is still applied to the log.
    pub async fn run<F: FrameSource>(
        mut self,
        mut frames: F,
        mut playback: mpsc::Receiver<PlaybackEvent>,
        mut user_messages: mpsc::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> SessionState {
        let mut interval = tokio::time::interval(self.config.commentary_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let (completed_tx, mut completed_rx) = mpsc::channel::<TickResult>(8);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }

                Some(event) = playback.recv() => {
                    self.state.apply(SessionInput::Playback(event));
                }

                Some(text) = user_messages.recv() => {
                    self.state.apply(SessionInput::UserMessage(text));
                }

                Some(result) = completed_rx.recv() => {
                    self.state.apply(SessionInput::Completed(result));
                }

                _ = interval.tick() => {
                    if self.state.apply(SessionInput::Tick) == TickAction::Sample {
                        self.submit(&mut frames, completed_tx.clone());
                    }
                }
            }
        }

        info!(
            entries = self.state.log.len(),
            waypoints = self.state.route.waypoints.len(),
            dropped_ticks = self.state.dropped_ticks,
            "session finished"
        );
        self.state
    }

    /// Grab one frame and submit it without blocking the reducer.
    fn submit<F: FrameSource>(&mut self, frames: &mut F, completed_tx: mpsc::Sender<TickResult>) {
        let frame = match frames.grab() {
            Ok(frame) => frame,
            Err(e) => {
                // The tick still completes, as a failure.
                self.state
                    .apply(SessionInput::Completed(TickResult::Failed(e.to_string())));
                return;
            }
        };

        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let result = match api.submit_frame(frame).await {
                Ok(response) => TickResult::Commentary(response),
                Err(e) => TickResult::Failed(e.to_string()),
            };
            // The session may already be shut down; a closed channel is fine.
            let _ = completed_tx.send(result).await;
        });
    }
}
