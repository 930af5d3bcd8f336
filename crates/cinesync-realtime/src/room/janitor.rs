//! Abandoned-room janitor.
//!
//! Rooms with no online members are closed once they sit idle past the
//! configured timeout. This is also how frozen rooms (owner gone, nobody
//! else connected) eventually die.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, info};

use crate::server::RealtimeEngine;

/// Runs the janitor sweep loop until shutdown.
pub async fn run_janitor(engine: RealtimeEngine, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = time::interval(Duration::from_secs(
        engine.config.janitor_interval_seconds.max(1),
    ));
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                sweep(&engine).await;
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }

    debug!("Room janitor stopped");
}

/// One janitor pass: closes every room with no online members whose last
/// activity predates the configured timeout.
pub async fn sweep(engine: &RealtimeEngine) {
    let timeout = chrono::Duration::seconds(engine.config.room_empty_timeout_seconds as i64);
    let cutoff = Utc::now() - timeout;

    for (room_id, room) in engine.rooms.all_rooms() {
        let abandoned = {
            let guard = room.lock().await;
            guard.online_count() == 0 && guard.last_activity < cutoff
        };

        if abandoned {
            info!(room_id = %room_id, "Closing abandoned room");
            // System closure: no requester, no authority check.
            if let Err(e) = engine.presence.close_room(room_id, None).await {
                // Lost a race with an owner close; nothing to do.
                debug!(room_id = %room_id, error = %e, "Janitor close skipped");
            }
        }
    }
}
