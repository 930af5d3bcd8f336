//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{debug, warn};

use cinesync_proto::ServerMessage;

use super::handle::ConnectionHandle;

/// Heartbeat configuration.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Deadline after which a silent connection is considered dead.
    pub ping_timeout: Duration,
}

/// Run the heartbeat loop for a connection.
///
/// Sends periodic pings and checks pong freshness. Marks the connection
/// dead when the client stops responding, which ends the socket's pump
/// loop and triggers presence cleanup.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // The first tick fires immediately; skip it so a fresh connection is
    // not pinged before it finishes the handshake.
    interval.tick().await;

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let silent_for = Utc::now() - handle.last_pong();
        if let Ok(silent) = silent_for.to_std() {
            if silent > config.ping_interval + config.ping_timeout {
                warn!(
                    conn_id = %handle.id,
                    silent_secs = silent.as_secs(),
                    "Heartbeat timeout, marking connection dead"
                );
                handle.mark_dead();
                break;
            }
        }

        let ping = ServerMessage::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if !handle.send(ping) && !handle.is_alive() {
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
