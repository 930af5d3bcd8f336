//! Inbound and outbound WebSocket event definitions.

use serde::{Deserialize, Serialize};

use cinesync_core::types::id::{RoomId, UserId};

use super::state::{ChatMessage, EmojiEvent, MemberEntry, RoomSnapshot, SyncState};

/// Events sent by a client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join a room. Answered with `room:joined` plus a `member:joined`
    /// broadcast to everyone else.
    #[serde(rename = "room:join")]
    RoomJoin {
        /// Target room.
        room_id: RoomId,
    },
    /// Leave the current room. Idempotent.
    #[serde(rename = "room:leave")]
    RoomLeave {
        /// Room being left.
        room_id: RoomId,
    },
    /// Start playback at the given position. Owner only.
    #[serde(rename = "video:play")]
    VideoPlay {
        /// Position in seconds.
        current_time: f64,
    },
    /// Pause playback at the given position. Owner only.
    #[serde(rename = "video:pause")]
    VideoPause {
        /// Position in seconds.
        current_time: f64,
    },
    /// Seek to the given position, preserving play/pause. Owner only.
    #[serde(rename = "video:seek")]
    VideoSeek {
        /// Position in seconds.
        current_time: f64,
    },
    /// This member started buffering. Informational, any member.
    #[serde(rename = "video:buffer_start")]
    VideoBufferStart {},
    /// This member stopped buffering.
    #[serde(rename = "video:buffer_end")]
    VideoBufferEnd {},
    /// Send a chat message to the room.
    #[serde(rename = "room:message")]
    RoomMessage {
        /// Message text (size-bounded server-side).
        message: String,
    },
    /// Send an emoji reaction to the room.
    #[serde(rename = "room:emoji")]
    RoomEmoji {
        /// The emoji glyph.
        emoji: String,
    },
    /// Kick a member out of the room. Owner only.
    #[serde(rename = "member:kick")]
    MemberKick {
        /// The member to remove.
        target_user_id: UserId,
    },
    /// Mute a member's chat. Owner only.
    #[serde(rename = "member:mute")]
    MemberMute {
        /// The member to mute.
        target_user_id: UserId,
        /// Optional reason shown to the room.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Lift a member's mute. Owner only.
    #[serde(rename = "member:unmute")]
    MemberUnmute {
        /// The member to unmute.
        target_user_id: UserId,
    },
    /// Pong response to a server ping.
    #[serde(rename = "pong")]
    Pong {
        /// Echoed server timestamp (unix millis).
        timestamp: i64,
    },
}

/// Events sent by the server to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Unicast reply to `room:join`: the full snapshot the client
    /// reconciles from, including retained chat history.
    #[serde(rename = "room:joined")]
    RoomJoined {
        /// Room snapshot.
        room: RoomSnapshot,
        /// Canonical playback state at join time.
        sync_state: SyncState,
        /// Retained chat history, oldest first.
        messages: Vec<ChatMessage>,
    },
    /// Unicast: this client is no longer in a room (left or kicked).
    #[serde(rename = "room:left")]
    RoomLeft {},
    /// Broadcast: the room was destroyed.
    #[serde(rename = "room:closed")]
    RoomClosed {},
    /// Broadcast: room-level fields changed (status, owner presence).
    #[serde(rename = "room:updated")]
    RoomUpdated {
        /// Updated snapshot.
        room: RoomSnapshot,
    },
    /// Broadcast: owner started playback.
    #[serde(rename = "video:play")]
    VideoPlay {
        /// New canonical state.
        sync_state: SyncState,
    },
    /// Broadcast: owner paused playback.
    #[serde(rename = "video:pause")]
    VideoPause {
        /// New canonical state.
        sync_state: SyncState,
    },
    /// Broadcast: owner seeked.
    #[serde(rename = "video:seek")]
    VideoSeek {
        /// New canonical state.
        sync_state: SyncState,
    },
    /// Broadcast: periodic drift correction while playing.
    #[serde(rename = "video:sync")]
    VideoSync {
        /// New canonical state.
        sync_state: SyncState,
    },
    /// Broadcast: a member's buffering state changed. Does not alter the
    /// canonical sync state.
    #[serde(rename = "video:buffer")]
    VideoBuffer {
        /// The buffering member.
        user_id: UserId,
        /// True at buffer start, false at buffer end.
        buffering: bool,
    },
    /// Broadcast: a member joined. Carries the complete member list.
    #[serde(rename = "member:joined")]
    MemberJoined {
        /// Who joined.
        user_id: UserId,
        /// Full updated member list.
        members: Vec<MemberEntry>,
    },
    /// Broadcast: a member left or disconnected.
    #[serde(rename = "member:left")]
    MemberLeft {
        /// Who left.
        user_id: UserId,
        /// Full updated member list.
        members: Vec<MemberEntry>,
    },
    /// Broadcast: a member was kicked by the owner.
    #[serde(rename = "member:kicked")]
    MemberKicked {
        /// Who was kicked.
        user_id: UserId,
        /// Full updated member list.
        members: Vec<MemberEntry>,
    },
    /// Broadcast: a member was muted.
    #[serde(rename = "member:muted")]
    MemberMuted {
        /// Who was muted.
        user_id: UserId,
        /// Who muted them (the owner).
        muted_by: UserId,
        /// Optional reason.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Broadcast: a member's mute was lifted.
    #[serde(rename = "member:unmuted")]
    MemberUnmuted {
        /// Who was unmuted.
        user_id: UserId,
    },
    /// Broadcast: a chat message.
    #[serde(rename = "room:message")]
    RoomMessage {
        /// The message.
        msg: ChatMessage,
    },
    /// Broadcast: an emoji reaction.
    #[serde(rename = "room:emoji")]
    RoomEmoji {
        /// The reaction.
        emoji: EmojiEvent,
    },
    /// Unicast: a command was rejected. Exactly one per rejected command,
    /// never broadcast.
    #[serde(rename = "error")]
    Error {
        /// Machine-readable code (`forbidden`, `room_full`, ...).
        code: String,
        /// Human-readable description.
        message: String,
    },
    /// Server keepalive ping.
    #[serde(rename = "ping")]
    Ping {
        /// Server timestamp (unix millis).
        timestamp: i64,
    },
}
