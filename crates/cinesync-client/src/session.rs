//! WebSocket client session.
//!
//! Owns the socket, answers server pings transparently, and surfaces
//! every other server event to the caller. Reconnect policy lives in
//! [`ReconnectBackoff`]; the session itself is single-connection.
//!
//! [`ReconnectBackoff`]: crate::backoff::ReconnectBackoff

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;
use tracing::{debug, warn};

use cinesync_core::error::AppError;
use cinesync_core::result::AppResult;
use cinesync_proto::{ClientMessage, ServerMessage};

use crate::backoff::ReconnectBackoff;

/// Something that happened on the session.
#[derive(Debug)]
pub enum SessionEvent {
    /// A server event arrived.
    Message(ServerMessage),
    /// The connection ended (server close, transport error, or shutdown).
    Disconnected,
}

/// A live watch-party session over one WebSocket connection.
#[derive(Debug)]
pub struct ClientSession {
    outbound: mpsc::Sender<ClientMessage>,
    events: mpsc::Receiver<SessionEvent>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ClientSession {
    /// Connects and authenticates in one step. The token rides the upgrade
    /// request; a rejected token fails here, before any event flows.
    pub async fn connect(server_url: &str, token: &str) -> AppResult<Self> {
        let url = format!("{server_url}/ws?token={token}");
        let (stream, _response) = connect_async(&url).await.map_err(|e| {
            AppError::service_unavailable(format!("WebSocket connect failed: {e}"))
        })?;
        let (mut sink, mut source) = stream.split();

        let (outbound, mut outbound_rx) = mpsc::channel::<ClientMessage>(64);
        let (events_tx, events) = mpsc::channel::<SessionEvent>(256);

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Dropping unencodable client event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        let pong_tx = outbound.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let msg = match serde_json::from_str::<ServerMessage>(text.as_str()) {
                            Ok(msg) => msg,
                            Err(e) => {
                                warn!(error = %e, "Undecodable server event");
                                continue;
                            }
                        };
                        // Keepalive is session plumbing, not caller traffic.
                        if let ServerMessage::Ping { timestamp } = msg {
                            let _ = pong_tx.send(ClientMessage::Pong { timestamp }).await;
                            continue;
                        }
                        if events_tx.send(SessionEvent::Message(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
            let _ = events_tx.send(SessionEvent::Disconnected).await;
        });

        Ok(Self {
            outbound,
            events,
            reader,
            writer,
        })
    }

    /// Connects with retries under the given backoff schedule.
    pub async fn connect_with_retry(
        server_url: &str,
        token: &str,
        backoff: &mut ReconnectBackoff,
        max_attempts: u32,
    ) -> AppResult<Self> {
        loop {
            match Self::connect(server_url, token).await {
                Ok(session) => {
                    backoff.reset();
                    return Ok(session);
                }
                Err(e) if backoff.attempts() + 1 >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = backoff.next_delay();
                    debug!(
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Reconnect attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Sends a client event to the server.
    pub async fn send(&self, msg: ClientMessage) -> AppResult<()> {
        self.outbound
            .send(msg)
            .await
            .map_err(|_| AppError::service_unavailable("Session is closed"))
    }

    /// Waits for the next session event. `None` after the session fully
    /// shuts down.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Closes the session. The writer drains, sends a close frame, and
    /// exits once the outbound sender drops; the reader is stopped here.
    pub fn close(self) {
        drop(self.outbound);
        drop(self.writer);
        self.reader.abort();
    }
}
