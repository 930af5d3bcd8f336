//! WebSocket upgrade handler and socket pump.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use cinesync_realtime::connection::authenticator::AuthenticatedUser;
use cinesync_realtime::connection::heartbeat::{run_heartbeat, HeartbeatConfig};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: String,
}

/// GET /ws?token={jwt} — WebSocket upgrade.
///
/// The token is verified before the upgrade completes: a bad token is an
/// HTTP 401, never an open-then-close socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let user = state.authenticator.authenticate(&query.token)?;
    Ok(ws.on_upgrade(move |socket| pump_socket(state, user, socket)))
}

/// Pumps an established WebSocket until either side hangs up.
async fn pump_socket(state: AppState, user: AuthenticatedUser, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.engine.register_connection(user).await;
    let conn_id = handle.id;

    info!(conn_id = %conn_id, user_id = %handle.user_id, "WebSocket connection established");

    // Forward engine events to the socket as JSON text frames.
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Dropping unencodable outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Heartbeat marks the handle dead and returns when the client goes
    // silent; selecting on it ends the inbound loop too.
    let mut heartbeat_task = tokio::spawn(run_heartbeat(
        handle.clone(),
        HeartbeatConfig {
            ping_interval: Duration::from_secs(state.config.realtime.ping_interval_seconds),
            ping_timeout: Duration::from_secs(state.config.realtime.ping_timeout_seconds),
        },
    ));

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        state.engine.handle_inbound(&conn_id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = &mut heartbeat_task => break,
        }
    }

    outbound_task.abort();
    heartbeat_task.abort();
    state.engine.unregister_connection(&conn_id).await;

    info!(conn_id = %conn_id, user_id = %handle.user_id, "WebSocket connection closed");
}
