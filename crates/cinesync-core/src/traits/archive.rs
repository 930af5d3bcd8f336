//! Closed-room hand-off to the external persistence collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::{MovieId, RoomId, UserId};

/// Projection of a room at the moment it is destroyed.
///
/// The in-memory store owns rooms for their lifetime; once a room closes,
/// this record is the only thing that survives, handed to [`RoomArchive`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedRoomRecord {
    /// Room identifier.
    pub room_id: RoomId,
    /// The room's owner.
    pub owner: UserId,
    /// Movie that was being watched.
    pub movie_id: MovieId,
    /// Invite code the room was reachable under.
    pub invite_code: String,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
    /// When the room was closed.
    pub closed_at: DateTime<Utc>,
    /// Chat history retained at close time (bounded ring contents).
    pub messages: Vec<ArchivedMessage>,
}

/// One chat message as it appears in the archive record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedMessage {
    /// Author.
    pub user_id: UserId,
    /// Author display name at send time.
    pub username: String,
    /// Message text.
    pub text: String,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

/// Trait for the external room-history persistence service.
#[async_trait]
pub trait RoomArchive: Send + Sync + std::fmt::Debug + 'static {
    /// Persist the record of a closed room. Failures are logged by the
    /// caller and never block room destruction.
    async fn archive(&self, record: ClosedRoomRecord) -> AppResult<()>;
}

/// Archive that discards everything. Default for tests and standalone runs.
#[derive(Debug, Default)]
pub struct NoopArchive;

#[async_trait]
impl RoomArchive for NoopArchive {
    async fn archive(&self, _record: ClosedRoomRecord) -> AppResult<()> {
        Ok(())
    }
}
