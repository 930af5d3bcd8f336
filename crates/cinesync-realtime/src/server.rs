//! Engine assembly and the single inbound dispatch point.
//!
//! `RealtimeEngine` wires the registry, room store, sync engine, presence
//! manager, and relay together, owns the background tasks, and routes
//! every decoded client event to the component that handles it. Every
//! rejected command turns into exactly one `error` unicast to the sender;
//! nothing propagates past this layer.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use cinesync_core::config::realtime::RealtimeConfig;
use cinesync_core::error::AppError;
use cinesync_core::result::AppResult;
use cinesync_core::traits::archive::RoomArchive;
use cinesync_core::traits::catalog::MovieCatalog;
use cinesync_core::types::id::{MovieId, RoomId, UserId};
use cinesync_proto::{ClientMessage, RoomSnapshot, ServerMessage};

use crate::connection::authenticator::AuthenticatedUser;
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::ConnectionRegistry;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::presence::manager::PresenceManager;
use crate::relay::MessageRelay;
use crate::room::janitor::run_janitor;
use crate::room::store::RoomStore;
use crate::sync::engine::SyncEngine;
use crate::sync::ticker::run_sync_ticker;

/// The assembled real-time engine. Cheap to clone; all state is shared.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Engine configuration.
    pub config: RealtimeConfig,
    /// All live connections.
    pub connections: Arc<ConnectionRegistry>,
    /// Authoritative room state.
    pub rooms: Arc<RoomStore>,
    /// Owner-authoritative playback control.
    pub sync: Arc<SyncEngine>,
    /// Membership and presence transitions.
    pub presence: Arc<PresenceManager>,
    /// Chat and emoji fan-out.
    pub relay: Arc<MessageRelay>,
    /// Shared counters.
    pub metrics: Arc<EngineMetrics>,
    /// Shutdown signal for background tasks.
    shutdown_tx: broadcast::Sender<()>,
}

impl RealtimeEngine {
    /// Assembles the engine around the given catalog and archive
    /// collaborators. Background tasks are not started; call [`start`].
    ///
    /// [`start`]: RealtimeEngine::start
    pub fn new(
        config: RealtimeConfig,
        catalog: Arc<dyn MovieCatalog>,
        archive: Arc<dyn RoomArchive>,
    ) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let connections = Arc::new(ConnectionRegistry::new(
            config.channel_buffer_size,
            metrics.clone(),
        ));
        let rooms = Arc::new(RoomStore::new(
            config.clone(),
            catalog,
            archive,
            metrics.clone(),
        ));
        let sync = Arc::new(SyncEngine::new(rooms.clone(), connections.clone()));
        let presence = Arc::new(PresenceManager::new(rooms.clone(), connections.clone()));
        let relay = Arc::new(MessageRelay::new(
            rooms.clone(),
            connections.clone(),
            config.clone(),
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            connections,
            rooms,
            sync,
            presence,
            relay,
            metrics,
            shutdown_tx,
        }
    }

    /// Spawns the drift-correction ticker and the abandoned-room janitor.
    pub fn start(&self) {
        tokio::spawn(run_sync_ticker(self.clone(), self.shutdown_tx.subscribe()));
        tokio::spawn(run_janitor(self.clone(), self.shutdown_tx.subscribe()));
        info!(
            sync_interval = self.config.sync_interval_seconds,
            janitor_interval = self.config.janitor_interval_seconds,
            "Realtime engine started"
        );
    }

    /// Signals background tasks to stop.
    pub fn shutdown(&self) {
        // Nobody subscribed is fine; tasks may already be gone.
        let _ = self.shutdown_tx.send(());
        info!("Realtime engine shutting down");
    }

    /// Registers an authenticated connection and returns its handle plus
    /// the outbound event stream the transport must pump to the socket.
    ///
    /// If the user already had a connection, the old one is superseded
    /// and its room membership torn down before the new one is usable.
    pub async fn register_connection(
        &self,
        user: AuthenticatedUser,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerMessage>) {
        let (handle, rx, superseded) = self.connections.register(user.user_id, user.username);
        if let Some(old) = superseded {
            self.presence.handle_disconnect(&old).await;
        }
        (handle, rx)
    }

    /// Tears down a dropped connection: unregisters it and runs presence
    /// cleanup so the room observes the departure.
    pub async fn unregister_connection(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.connections.unregister(conn_id) {
            self.presence.handle_disconnect(&handle).await;
        }
    }

    /// Creates a room owned by `owner`.
    pub async fn create_room(
        &self,
        owner: UserId,
        owner_name: &str,
        movie_id: MovieId,
        max_members: usize,
    ) -> AppResult<RoomSnapshot> {
        self.rooms
            .create_room(owner, owner_name, movie_id, max_members)
            .await
    }

    /// Closes a room at the owner's request.
    pub async fn close_room(&self, room_id: RoomId, requester: UserId) -> AppResult<()> {
        self.presence.close_room(room_id, Some(requester)).await
    }

    /// Decodes and dispatches one raw inbound frame.
    ///
    /// A frame that fails to decode, and any command a component rejects,
    /// is answered with a single `error` unicast to the sender. Errors
    /// never fan out and never close the connection.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.connections.get(conn_id) else {
            debug!(conn_id = %conn_id, "Inbound frame for unknown connection");
            return;
        };
        self.metrics.message_received();

        let msg = match serde_json::from_str::<ClientMessage>(raw) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Undecodable client frame");
                self.reject(
                    &handle,
                    &AppError::validation(format!("Invalid message: {e}")),
                );
                return;
            }
        };

        if let Err(e) = self.dispatch(&handle, msg).await {
            self.reject(&handle, &e);
        }
    }

    async fn dispatch(&self, handle: &Arc<ConnectionHandle>, msg: ClientMessage) -> AppResult<()> {
        match msg {
            ClientMessage::RoomJoin { room_id } => self.presence.join(handle, room_id).await,
            ClientMessage::RoomLeave { room_id } => self.presence.leave(handle, room_id).await,
            ClientMessage::VideoPlay { current_time } => self.sync.play(handle, current_time).await,
            ClientMessage::VideoPause { current_time } => {
                self.sync.pause(handle, current_time).await
            }
            ClientMessage::VideoSeek { current_time } => self.sync.seek(handle, current_time).await,
            ClientMessage::VideoBufferStart {} => self.sync.buffer(handle, true).await,
            ClientMessage::VideoBufferEnd {} => self.sync.buffer(handle, false).await,
            ClientMessage::RoomMessage { message } => {
                self.relay.send_message(handle, &message).await
            }
            ClientMessage::RoomEmoji { emoji } => self.relay.send_emoji(handle, &emoji).await,
            ClientMessage::MemberKick { target_user_id } => {
                self.presence.kick(handle, target_user_id).await
            }
            ClientMessage::MemberMute {
                target_user_id,
                reason,
            } => self.presence.mute(handle, target_user_id, reason).await,
            ClientMessage::MemberUnmute { target_user_id } => {
                self.presence.unmute(handle, target_user_id).await
            }
            ClientMessage::Pong { timestamp: _ } => {
                handle.record_pong();
                Ok(())
            }
        }
    }

    fn reject(&self, handle: &Arc<ConnectionHandle>, error: &AppError) {
        debug!(
            user_id = %handle.user_id,
            code = error.kind.code(),
            "Rejecting client command"
        );
        self.connections.unicast(
            &handle.user_id,
            ServerMessage::Error {
                code: error.kind.code().to_string(),
                message: error.message.clone(),
            },
        );
    }

    /// Current engine counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
