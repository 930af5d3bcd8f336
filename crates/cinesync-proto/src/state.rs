//! Shared data model: the room snapshot and playback state every client
//! reconciles toward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinesync_core::types::id::{MessageId, RoomId, UserId};
use cinesync_core::types::movie::MovieInfo;

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Created, playback not started yet.
    Waiting,
    /// Playback running.
    Playing,
    /// Playback paused by the owner.
    Paused,
    /// Room closed; terminal.
    Ended,
}

/// The canonical playback state of a room.
///
/// Exactly one `SyncState` is canonical per room at any instant. It is
/// replaced wholesale on every owner command and drift tick, never merged,
/// and `updated_at` never moves backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Playback position in seconds at `updated_at`.
    pub current_time: f64,
    /// Whether playback is running.
    pub is_playing: bool,
    /// When this state became canonical.
    pub updated_at: DateTime<Utc>,
}

impl SyncState {
    /// The state every room starts in: position zero, paused.
    pub fn at_rest() -> Self {
        Self {
            current_time: 0.0,
            is_playing: false,
            updated_at: Utc::now(),
        }
    }

    /// Playback position at `now`, extrapolating elapsed wall time while
    /// playing. This is the reconciliation a late joiner performs.
    pub fn position_at(&self, now: DateTime<Utc>) -> f64 {
        if !self.is_playing {
            return self.current_time;
        }
        let elapsed = (now - self.updated_at).num_milliseconds() as f64 / 1000.0;
        self.current_time + elapsed.max(0.0)
    }
}

/// One member of a room as seen by every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    /// The member's user id.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Whether the member currently has a live connection.
    pub online: bool,
    /// Whether the owner has muted this member.
    pub muted: bool,
    /// When the member first joined.
    pub joined_at: DateTime<Utc>,
}

/// Full room snapshot, unicast on join and broadcast on room-level changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Room identifier.
    pub id: RoomId,
    /// The owner — the only member with write authority over playback.
    pub owner: UserId,
    /// Movie being watched.
    pub movie: MovieInfo,
    /// Complete, deduplicated member list in join order.
    pub members: Vec<MemberEntry>,
    /// Code the room is joinable under.
    pub invite_code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Member capacity.
    pub max_members: usize,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
}

/// A chat message, retained in the room's bounded history ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Author.
    pub user_id: UserId,
    /// Author display name at send time.
    pub username: String,
    /// Message text.
    pub text: String,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

/// An emoji reaction. Ephemeral: never delivered to late joiners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiEvent {
    /// Author.
    pub user_id: UserId,
    /// Author display name at send time.
    pub username: String,
    /// The emoji glyph.
    pub emoji: String,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn at_rest_starts_paused_at_zero() {
        let state = SyncState::at_rest();
        assert_eq!(state.current_time, 0.0);
        assert!(!state.is_playing);
    }

    #[test]
    fn position_extrapolates_while_playing() {
        let state = SyncState {
            current_time: 120.5,
            is_playing: true,
            updated_at: Utc::now(),
        };
        let later = state.updated_at + Duration::seconds(30);
        assert!((state.position_at(later) - 150.5).abs() < 0.01);
    }

    #[test]
    fn position_frozen_while_paused() {
        let state = SyncState {
            current_time: 42.0,
            is_playing: false,
            updated_at: Utc::now(),
        };
        let later = state.updated_at + Duration::seconds(300);
        assert_eq!(state.position_at(later), 42.0);
    }

    #[test]
    fn position_never_extrapolates_backwards() {
        let state = SyncState {
            current_time: 10.0,
            is_playing: true,
            updated_at: Utc::now(),
        };
        let earlier = state.updated_at - Duration::seconds(5);
        assert_eq!(state.position_at(earlier), 10.0);
    }
}
