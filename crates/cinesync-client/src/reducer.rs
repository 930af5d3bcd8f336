//! Pure reducer folding server events into a local room view.
//!
//! The reducer holds no clocks and performs no IO: it applies each server
//! event to its state, and `position_at` derives the playhead from the
//! last canonical sync state plus the caller's wall-clock time. Member
//! lists are replaced wholesale from broadcasts, never patched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use cinesync_core::types::id::UserId;
use cinesync_proto::{ChatMessage, RoomSnapshot, ServerMessage, SyncState};

/// Local view of the room a client is in.
#[derive(Debug, Clone, Default)]
pub struct ClientRoomState {
    /// Snapshot of the current room; `None` when not in a room.
    pub room: Option<RoomSnapshot>,
    /// Last canonical playback state received.
    pub sync: Option<SyncState>,
    /// Chat history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Members currently reporting buffering.
    pub buffering: HashSet<UserId>,
    /// Last `error` event received, as `(code, message)`.
    pub last_error: Option<(String, String)>,
}

impl ClientRoomState {
    /// An empty state, not in any room.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the client is currently in a room.
    pub fn in_room(&self) -> bool {
        self.room.is_some()
    }

    /// The playhead position at `now`, derived from the last canonical
    /// state. `None` when no state has been received yet.
    pub fn position_at(&self, now: DateTime<Utc>) -> Option<f64> {
        self.sync.as_ref().map(|s| s.position_at(now))
    }

    /// Applies one server event.
    pub fn apply(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::RoomJoined {
                room,
                sync_state,
                messages,
            } => {
                self.room = Some(room.clone());
                self.sync = Some(sync_state.clone());
                self.messages = messages.clone();
                self.buffering.clear();
                self.last_error = None;
            }
            ServerMessage::RoomLeft {} | ServerMessage::RoomClosed {} => {
                self.room = None;
                self.sync = None;
                self.messages.clear();
                self.buffering.clear();
            }
            ServerMessage::RoomUpdated { room } => {
                self.room = Some(room.clone());
            }
            ServerMessage::VideoPlay { sync_state }
            | ServerMessage::VideoPause { sync_state }
            | ServerMessage::VideoSeek { sync_state }
            | ServerMessage::VideoSync { sync_state } => {
                // The server's state is always canonical; replace, never merge.
                self.sync = Some(sync_state.clone());
            }
            ServerMessage::VideoBuffer { user_id, buffering } => {
                if *buffering {
                    self.buffering.insert(*user_id);
                } else {
                    self.buffering.remove(user_id);
                }
            }
            ServerMessage::MemberJoined { members, .. }
            | ServerMessage::MemberLeft { members, .. }
            | ServerMessage::MemberKicked { members, .. } => {
                if let Some(room) = self.room.as_mut() {
                    room.members = members.clone();
                }
            }
            ServerMessage::MemberMuted { user_id, .. } => {
                self.set_muted(user_id, true);
            }
            ServerMessage::MemberUnmuted { user_id } => {
                self.set_muted(user_id, false);
            }
            ServerMessage::RoomMessage { msg } => {
                self.messages.push(msg.clone());
            }
            // Emoji is ephemeral; surfacing it is the UI's concern.
            ServerMessage::RoomEmoji { .. } => {}
            ServerMessage::Error { code, message } => {
                self.last_error = Some((code.clone(), message.clone()));
            }
            // Answered at the session layer.
            ServerMessage::Ping { .. } => {}
        }
    }

    fn set_muted(&mut self, user_id: &UserId, muted: bool) {
        if let Some(room) = self.room.as_mut() {
            if let Some(member) = room.members.iter_mut().find(|m| m.user_id == *user_id) {
                member.muted = muted;
            }
        }
    }
}
