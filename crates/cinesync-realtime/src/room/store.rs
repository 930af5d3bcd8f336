//! Room state store — authoritative in-memory rooms, serialized per room.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{error, info};

use cinesync_core::config::realtime::RealtimeConfig;
use cinesync_core::error::AppError;
use cinesync_core::result::AppResult;
use cinesync_core::traits::archive::{ArchivedMessage, ClosedRoomRecord, RoomArchive};
use cinesync_core::traits::catalog::MovieCatalog;
use cinesync_core::types::id::{MovieId, RoomId, UserId};
use cinesync_proto::{RoomSnapshot, RoomStatus};

use crate::metrics::EngineMetrics;

use super::room::Room;

/// Alphabet for invite codes; ambiguous glyphs left out.
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const INVITE_LEN: usize = 6;

/// Owns every live room. Each room sits behind its own mutex, so two
/// mutations of the same room are serialized while different rooms
/// proceed fully in parallel.
pub struct RoomStore {
    /// Room ID → room, each behind a per-room writer lock.
    rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
    /// Invite code → room ID.
    invites: DashMap<String, RoomId>,
    /// Movie metadata collaborator.
    catalog: Arc<dyn MovieCatalog>,
    /// Closed-room persistence collaborator.
    archive: Arc<dyn RoomArchive>,
    /// Engine configuration.
    config: RealtimeConfig,
    /// Shared counters.
    metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for RoomStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomStore")
            .field("rooms", &self.rooms.len())
            .finish()
    }
}

impl RoomStore {
    /// Creates an empty store.
    pub fn new(
        config: RealtimeConfig,
        catalog: Arc<dyn MovieCatalog>,
        archive: Arc<dyn RoomArchive>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            rooms: DashMap::new(),
            invites: DashMap::new(),
            catalog,
            archive,
            config,
            metrics,
        }
    }

    /// Creates a new room owned by `owner`, with playback at rest.
    ///
    /// Fails with `Validation` for a capacity below 2 or above the
    /// configured ceiling, and with `NotFound` if the catalog does not
    /// know the movie.
    pub async fn create_room(
        &self,
        owner: UserId,
        owner_name: &str,
        movie_id: MovieId,
        max_members: usize,
    ) -> AppResult<RoomSnapshot> {
        if max_members < 2 {
            return Err(AppError::validation(
                "A room needs capacity for at least 2 members",
            ));
        }
        if max_members > self.config.max_members_ceiling {
            return Err(AppError::validation(format!(
                "Room capacity exceeds the ceiling of {}",
                self.config.max_members_ceiling
            )));
        }

        let movie = self.catalog.lookup(movie_id).await?;
        let invite_code = self.unique_invite_code();

        let room = Room::new(
            owner,
            owner_name.to_string(),
            movie,
            invite_code.clone(),
            max_members,
            self.config.chat_history,
            self.config.emoji_history,
        );
        let room_id = room.id;
        let snapshot = room.snapshot();

        self.invites.insert(invite_code, room_id);
        self.rooms.insert(room_id, Arc::new(Mutex::new(room)));
        self.metrics.room_created();

        info!(room_id = %room_id, owner = %owner, movie = %movie_id, "Room created");

        Ok(snapshot)
    }

    /// Gets the per-room lock for a room, or `NotFound`.
    pub fn get(&self, room_id: &RoomId) -> AppResult<Arc<Mutex<Room>>> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))
    }

    /// Snapshot of a room, or `NotFound`.
    pub async fn snapshot(&self, room_id: &RoomId) -> AppResult<RoomSnapshot> {
        let room = self.get(room_id)?;
        let guard = room.lock().await;
        Ok(guard.snapshot())
    }

    /// Resolves an invite code to a room snapshot, for the room-CRUD
    /// collaborator.
    pub async fn find_by_invite(&self, code: &str) -> AppResult<RoomSnapshot> {
        let room_id = self
            .invites
            .get(code)
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::not_found(format!("No room under invite code {code}")))?;
        self.snapshot(&room_id).await
    }

    /// Detaches a room from the store so no new operations can reach it.
    /// Returns the lock for final eviction and archival.
    pub fn detach(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        let (_, room) = self.rooms.remove(room_id)?;
        Some(room)
    }

    /// Finalizes a detached room: marks it ended, hands the record to the
    /// archive collaborator, and clears the history rings.
    pub async fn destroy(&self, room: &Arc<Mutex<Room>>) {
        let record = {
            let mut guard = room.lock().await;
            guard.status = RoomStatus::Ended;
            self.invites.remove(&guard.invite_code);

            let record = ClosedRoomRecord {
                room_id: guard.id,
                owner: guard.owner,
                movie_id: guard.movie.id,
                invite_code: guard.invite_code.clone(),
                created_at: guard.created_at,
                closed_at: Utc::now(),
                messages: guard
                    .messages
                    .iter()
                    .map(|m| ArchivedMessage {
                        user_id: m.user_id,
                        username: m.username.clone(),
                        text: m.text.clone(),
                        sent_at: m.sent_at,
                    })
                    .collect(),
            };

            guard.messages.clear();
            guard.emoji.clear();
            record
        };

        let room_id = record.room_id;
        if let Err(e) = self.archive.archive(record).await {
            // Archival is best-effort; destruction proceeds regardless.
            error!(room_id = %room_id, error = %e, "Room archive failed");
        }

        self.metrics.room_closed();
        info!(room_id = %room_id, "Room destroyed");
    }

    /// All live rooms, for the drift ticker and janitor sweeps.
    pub fn all_rooms(&self) -> Vec<(RoomId, Arc<Mutex<Room>>)> {
        self.rooms
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn unique_invite_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..INVITE_LEN)
                .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
                .collect();
            if !self.invites.contains_key(&code) {
                return code;
            }
        }
    }
}
