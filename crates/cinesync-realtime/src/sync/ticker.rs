//! Periodic drift-correction ticker.
//!
//! Server-push `video:sync` rebroadcasts correct clock drift for members
//! who joined mid-playback or missed an event.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::debug;

use crate::server::RealtimeEngine;

/// Runs the drift-correction loop until shutdown.
pub async fn run_sync_ticker(engine: RealtimeEngine, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = time::interval(Duration::from_secs(
        engine.config.sync_interval_seconds.max(1),
    ));
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                engine.sync.tick().await;
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }

    debug!("Sync ticker stopped");
}
