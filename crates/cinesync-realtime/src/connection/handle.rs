//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use cinesync_core::types::id::{RoomId, UserId};
use cinesync_proto::ServerMessage;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// Holds the bounded sender for pushing events to the client plus metadata
/// about the connected user. Exactly one room membership is tracked per
/// handle; the user can never appear in two rooms through one connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Display name (cached from the identity token).
    pub username: String,
    /// Sender for outbound events.
    sender: mpsc::Sender<ServerMessage>,
    /// The room this connection is currently joined to, if any.
    room: Mutex<Option<RoomId>>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Last pong received.
    last_pong: Mutex<DateTime<Utc>>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(user_id: UserId, username: String, sender: mpsc::Sender<ServerMessage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            username,
            sender,
            room: Mutex::new(None),
            connected_at: now,
            last_pong: Mutex::new(now),
            alive: AtomicBool::new(true),
        }
    }

    /// Send an event to this connection.
    ///
    /// Never blocks: if the client's buffer is full the event is dropped
    /// for this connection only, so one slow member cannot stall the room.
    pub fn send(&self, msg: ServerMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// The room this connection is currently in, if any.
    pub fn current_room(&self) -> Option<RoomId> {
        *self.room.lock().expect("room slot poisoned")
    }

    /// Record that this connection joined a room.
    pub fn set_room(&self, room_id: RoomId) {
        *self.room.lock().expect("room slot poisoned") = Some(room_id);
    }

    /// Clear the room slot, returning the previous membership.
    pub fn take_room(&self) -> Option<RoomId> {
        self.room.lock().expect("room slot poisoned").take()
    }

    /// Record a pong response.
    pub fn record_pong(&self) {
        *self.last_pong.lock().expect("pong slot poisoned") = Utc::now();
    }

    /// When the last pong was received.
    pub fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.lock().expect("pong slot poisoned")
    }
}
