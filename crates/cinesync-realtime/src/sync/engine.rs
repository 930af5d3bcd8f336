//! Sync engine — computes and broadcasts canonical playback state.
//!
//! Only the room owner may alter canonical state; that single-writer rule
//! removes last-writer races by construction. Owner commands are applied
//! in arrival order and never rejected for staleness — the owner's client
//! is the source of truth.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use cinesync_core::error::AppError;
use cinesync_core::result::AppResult;
use cinesync_core::types::id::RoomId;
use cinesync_proto::{RoomStatus, ServerMessage, SyncState};

use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::room::store::RoomStore;

/// Owner-authoritative playback control.
#[derive(Debug)]
pub struct SyncEngine {
    /// Room state store.
    store: Arc<RoomStore>,
    /// Connection registry for fan-out.
    registry: Arc<ConnectionRegistry>,
}

/// Which playback command is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Pause,
    Seek,
}

impl SyncEngine {
    /// Creates a new sync engine.
    pub fn new(store: Arc<RoomStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Owner starts playback at `current_time`. Broadcast to every member
    /// including the owner, who reconciles too.
    pub async fn play(&self, handle: &Arc<ConnectionHandle>, current_time: f64) -> AppResult<()> {
        self.apply(handle, Command::Play, current_time).await
    }

    /// Owner pauses playback at `current_time`.
    pub async fn pause(&self, handle: &Arc<ConnectionHandle>, current_time: f64) -> AppResult<()> {
        self.apply(handle, Command::Pause, current_time).await
    }

    /// Owner seeks to `current_time`, preserving play/pause.
    pub async fn seek(&self, handle: &Arc<ConnectionHandle>, current_time: f64) -> AppResult<()> {
        self.apply(handle, Command::Seek, current_time).await
    }

    async fn apply(
        &self,
        handle: &Arc<ConnectionHandle>,
        command: Command,
        current_time: f64,
    ) -> AppResult<()> {
        let room_id = handle
            .current_room()
            .ok_or_else(|| AppError::not_found("Not currently in a room"))?;
        let room = self.store.get(&room_id)?;

        let (recipients, msg, status_change) = {
            let mut guard = room.lock().await;

            if guard.owner != handle.user_id {
                return Err(AppError::forbidden(
                    "Only the room owner can control playback",
                ));
            }
            validate_position(current_time, guard.movie.duration_seconds)?;

            let is_playing = match command {
                Command::Play => true,
                Command::Pause => false,
                Command::Seek => guard.sync.is_playing,
            };
            let state = guard.replace_sync(current_time, is_playing);

            let next_status = match command {
                Command::Play => Some(RoomStatus::Playing),
                Command::Pause => Some(RoomStatus::Paused),
                Command::Seek => None,
            };
            let status_change = match next_status {
                Some(next) if guard.status != next => {
                    guard.status = next;
                    Some(ServerMessage::RoomUpdated {
                        room: guard.snapshot(),
                    })
                }
                _ => None,
            };

            let msg = match command {
                Command::Play => ServerMessage::VideoPlay { sync_state: state },
                Command::Pause => ServerMessage::VideoPause { sync_state: state },
                Command::Seek => ServerMessage::VideoSeek { sync_state: state },
            };
            (guard.member_ids(), msg, status_change)
        };

        self.registry.broadcast(&recipients, &msg);
        if let Some(update) = status_change {
            self.registry.broadcast(&recipients, &update);
        }

        info!(
            room_id = %room_id,
            command = ?command,
            position = current_time,
            "Playback command applied"
        );
        Ok(())
    }

    /// A member reports buffering start/stop. Informational fan-out only:
    /// any member may send it and the canonical state is untouched.
    pub async fn buffer(&self, handle: &Arc<ConnectionHandle>, buffering: bool) -> AppResult<()> {
        let room_id = handle
            .current_room()
            .ok_or_else(|| AppError::not_found("Not currently in a room"))?;
        let room = self.store.get(&room_id)?;

        let recipients = {
            let guard = room.lock().await;
            if !guard.is_member(&handle.user_id) {
                return Err(AppError::forbidden("Not a member of this room"));
            }
            guard.member_ids()
        };

        self.registry.broadcast(
            &recipients,
            &ServerMessage::VideoBuffer {
                user_id: handle.user_id,
                buffering,
            },
        );
        Ok(())
    }

    /// One drift-correction pass over every playing room.
    ///
    /// Rooms whose owner is offline are frozen: their state neither
    /// advances nor rebroadcasts until the owner returns. The extrapolated
    /// position is clamped to the movie's runtime.
    pub async fn tick(&self) {
        for (room_id, room) in self.store.all_rooms() {
            let broadcast = {
                let mut guard = room.lock().await;
                if guard.status != RoomStatus::Playing || !guard.sync.is_playing {
                    None
                } else if !self.registry.is_online(&guard.owner) {
                    debug!(room_id = %room_id, "Owner offline, sync frozen");
                    None
                } else {
                    let position = guard
                        .sync
                        .position_at(Utc::now())
                        .min(guard.movie.duration_seconds);
                    let state = guard.replace_sync(position, true);
                    Some((
                        guard.member_ids(),
                        ServerMessage::VideoSync { sync_state: state },
                    ))
                }
            };

            if let Some((recipients, msg)) = broadcast {
                self.registry.broadcast(&recipients, &msg);
            }
        }
    }

    /// Current canonical state of a room, mainly for tests and health
    /// introspection.
    pub async fn current_state(&self, room_id: &RoomId) -> AppResult<SyncState> {
        let room = self.store.get(room_id)?;
        let guard = room.lock().await;
        Ok(guard.sync.clone())
    }
}

/// Positions must land inside the movie: non-negative, finite, and no
/// further than the stream's length.
fn validate_position(current_time: f64, duration: f64) -> AppResult<()> {
    if !current_time.is_finite() || current_time < 0.0 {
        return Err(AppError::validation(format!(
            "Invalid playback position {current_time}"
        )));
    }
    if current_time > duration {
        return Err(AppError::validation(format!(
            "Position {current_time}s is beyond the movie's {duration}s runtime"
        )));
    }
    Ok(())
}
