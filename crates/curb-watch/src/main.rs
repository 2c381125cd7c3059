//! Headless watch session binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use curb_watch::{
    AnalyticsPoller, DirectoryFrameSource, HttpCommentaryApi, PlaybackEvent, Session, WatchConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("curb=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting curb-watch");

    let config = WatchConfig::from_env();
    info!(
        "Watch config: api={}, frames={}",
        config.api_base_url, config.frames_dir
    );

    let frames = DirectoryFrameSource::new(&config.frames_dir, 1280, 720)
        .with_context(|| format!("loading frames from {}", config.frames_dir))?;

    let api = Arc::new(HttpCommentaryApi::new(&config.api_base_url));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (playback_tx, playback_rx) = mpsc::channel(8);
    let (_user_tx, user_rx) = mpsc::channel(8);

    // Analytics polling runs regardless of playback state.
    let poller = AnalyticsPoller::new(Arc::clone(&api), config.clone());
    let poller_handle = tokio::spawn(poller.run(shutdown_rx.clone()));

    let session = Session::new(api, config);
    let session_handle = tokio::spawn(session.run(frames, playback_rx, user_rx, shutdown_rx));

    // The headless surface starts playing immediately.
    playback_tx.send(PlaybackEvent::Play).await.ok();

    tokio::signal::ctrl_c()
        .await
        .context("installing CTRL+C handler")?;
    info!("Received shutdown signal");

    shutdown_tx.send(true).ok();

    let state = session_handle.await.context("session task panicked")?;
    poller_handle.await.ok();

    info!(
        "Watch session complete: {} log entries, {} waypoints, {} dropped ticks",
        state.log.len(),
        state.route.waypoints.len(),
        state.dropped_ticks
    );

    Ok(())
}
