//! The room aggregate — membership, playback state, and history rings.

use chrono::{DateTime, Utc};

use cinesync_core::types::id::{RoomId, UserId};
use cinesync_core::types::movie::MovieInfo;
use cinesync_proto::{ChatMessage, EmojiEvent, MemberEntry, RoomSnapshot, RoomStatus, SyncState};

use super::history::BoundedRing;

/// One member's authoritative record inside a room.
#[derive(Debug, Clone)]
pub struct Member {
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

impl Member {
    fn entry(&self) -> MemberEntry {
        MemberEntry {
            user_id: self.user_id,
            username: self.username.clone(),
            online: self.online,
            muted: self.muted,
            joined_at: self.joined_at,
        }
    }
}

/// A single watch-party room.
///
/// Owned exclusively by the [`RoomStore`](super::store::RoomStore) and
/// only reachable behind its per-room mutex, so every mutation here runs
/// serialized with respect to the room.
#[derive(Debug)]
pub struct Room {
    /// Room identifier.
    pub id: RoomId,
    /// The owner — the single authoritative writer for playback state.
    pub owner: UserId,
    /// Movie being watched.
    pub movie: MovieInfo,
    /// Members in join order. The owner is always present.
    pub members: Vec<Member>,
    /// Invite code.
    pub invite_code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Member capacity.
    pub max_members: usize,
    /// Canonical playback state.
    pub sync: SyncState,
    /// Retained chat history.
    pub messages: BoundedRing<ChatMessage>,
    /// Ephemeral emoji history.
    pub emoji: BoundedRing<EmojiEvent>,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
    /// Last time anything happened in the room, for janitor timeouts.
    pub last_activity: DateTime<Utc>,
}

impl Room {
    /// Creates a room with the owner as its first (offline) member and
    /// playback at rest.
    pub fn new(
        owner: UserId,
        owner_name: String,
        movie: MovieInfo,
        invite_code: String,
        max_members: usize,
        chat_capacity: usize,
        emoji_capacity: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RoomId::new(),
            owner,
            movie,
            members: vec![Member {
                user_id: owner,
                username: owner_name,
                online: false,
                muted: false,
                joined_at: now,
            }],
            invite_code,
            status: RoomStatus::Waiting,
            max_members,
            sync: SyncState::at_rest(),
            messages: BoundedRing::new(chat_capacity),
            emoji: BoundedRing::new(emoji_capacity),
            created_at: now,
            last_activity: now,
        }
    }

    /// Looks up a member.
    pub fn member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == *user_id)
    }

    /// Looks up a member mutably.
    pub fn member_mut(&mut self, user_id: &UserId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user_id == *user_id)
    }

    /// Whether the user is a member.
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.member(user_id).is_some()
    }

    /// Removes a member, returning whether they were present.
    pub fn remove_member(&mut self, user_id: &UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.user_id != *user_id);
        self.members.len() < before
    }

    /// All member ids — the broadcast recipient set.
    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    /// The complete, deduplicated member list for wire broadcasts.
    pub fn member_entries(&self) -> Vec<MemberEntry> {
        self.members.iter().map(Member::entry).collect()
    }

    /// Number of members with a live connection.
    pub fn online_count(&self) -> usize {
        self.members.iter().filter(|m| m.online).count()
    }

    /// Replaces the canonical sync state, keeping `updated_at` monotonic.
    pub fn replace_sync(&mut self, current_time: f64, is_playing: bool) -> SyncState {
        let updated_at = Utc::now().max(self.sync.updated_at);
        self.sync = SyncState {
            current_time,
            is_playing,
            updated_at,
        };
        self.touch();
        self.sync.clone()
    }

    /// Records room activity, deferring the janitor.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Wire snapshot of the room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            owner: self.owner,
            movie: self.movie.clone(),
            members: self.member_entries(),
            invite_code: self.invite_code.clone(),
            status: self.status,
            max_members: self.max_members,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinesync_core::types::id::MovieId;

    fn test_movie() -> MovieInfo {
        MovieInfo {
            id: MovieId::new(),
            title: "Night Train".to_string(),
            duration_seconds: 5400.0,
            stream_url: "https://streams.example/night-train.m3u8".to_string(),
        }
    }

    fn test_room() -> Room {
        Room::new(
            UserId::new(),
            "owner".to_string(),
            test_movie(),
            "AB12CD".to_string(),
            4,
            200,
            50,
        )
    }

    #[test]
    fn owner_is_a_member_from_creation() {
        let room = test_room();
        assert!(room.is_member(&room.owner));
        assert_eq!(room.members.len(), 1);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(!room.sync.is_playing);
    }

    #[test]
    fn replace_sync_keeps_updated_at_monotonic() {
        let mut room = test_room();
        // Force a future timestamp, then replace again: updated_at must not
        // move backwards.
        room.sync.updated_at = Utc::now() + chrono::Duration::seconds(60);
        let future = room.sync.updated_at;
        let state = room.replace_sync(10.0, true);
        assert!(state.updated_at >= future);
        assert_eq!(state.current_time, 10.0);
    }

    #[test]
    fn remove_member_is_idempotent() {
        let mut room = test_room();
        let owner = room.owner;
        let ghost = UserId::new();
        assert!(!room.remove_member(&ghost));
        assert!(room.remove_member(&owner));
        assert!(!room.remove_member(&owner));
    }
}
