//! Presence & membership manager — join/leave/kick/mute transitions and
//! their broadcasts.
//!
//! Membership broadcasts always carry the complete, deduplicated member
//! list rather than a delta, so clients reconcile by replacement.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use cinesync_core::error::AppError;
use cinesync_core::result::AppResult;
use cinesync_core::types::id::{RoomId, UserId};
use cinesync_proto::ServerMessage;

use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::room::room::Member;
use crate::room::store::RoomStore;

/// Manages room membership and presence state.
#[derive(Debug)]
pub struct PresenceManager {
    /// Room state store.
    store: Arc<RoomStore>,
    /// Connection registry for fan-out.
    registry: Arc<ConnectionRegistry>,
}

impl PresenceManager {
    /// Creates a new presence manager.
    pub fn new(store: Arc<RoomStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Joins the connection's user to a room.
    ///
    /// A returning member (including the owner) is flipped back online
    /// rather than duplicated, and is exempt from the capacity check.
    /// The joiner is unicast the full `room:joined` snapshot — room,
    /// canonical sync state, and retained chat history — while everyone
    /// else receives `member:joined` with the complete member list.
    pub async fn join(&self, handle: &Arc<ConnectionHandle>, room_id: RoomId) -> AppResult<()> {
        // One room per connection: joining while in a different room
        // departs the old one first (owner departure closes it).
        if let Some(previous) = handle.current_room() {
            if previous != room_id {
                debug!(
                    user_id = %handle.user_id,
                    previous = %previous,
                    next = %room_id,
                    "Join switches rooms, departing previous"
                );
                self.leave(handle, previous).await?;
            }
        }

        let room = self.store.get(&room_id)?;
        let (joined, others) = {
            let mut guard = room.lock().await;

            match guard.member_mut(&handle.user_id) {
                Some(member) => {
                    member.online = true;
                    member.username = handle.username.clone();
                }
                None => {
                    if guard.members.len() >= guard.max_members {
                        return Err(AppError::room_full(format!(
                            "Room is at its capacity of {}",
                            guard.max_members
                        )));
                    }
                    guard.members.push(Member {
                        user_id: handle.user_id,
                        username: handle.username.clone(),
                        online: true,
                        muted: false,
                        joined_at: Utc::now(),
                    });
                }
            }
            guard.touch();

            let joined = ServerMessage::RoomJoined {
                room: guard.snapshot(),
                sync_state: guard.sync.clone(),
                messages: guard.messages.to_vec(),
            };
            let others = (
                guard
                    .member_ids()
                    .into_iter()
                    .filter(|id| *id != handle.user_id)
                    .collect::<Vec<_>>(),
                ServerMessage::MemberJoined {
                    user_id: handle.user_id,
                    members: guard.member_entries(),
                },
            );
            (joined, others)
        };

        handle.set_room(room_id);
        self.registry.broadcast(&others.0, &others.1);
        self.registry.unicast(&handle.user_id, joined);

        info!(user_id = %handle.user_id, room_id = %room_id, "Member joined room");
        Ok(())
    }

    /// Explicitly leaves a room. Idempotent: leaving a room the user is
    /// not in succeeds quietly, without a `room:left` reply — the confirmation
    /// is only sent when the leave actually detached something, so a stray
    /// leave for a foreign room cannot wipe the client's real room view.
    /// An owner's explicit leave closes the room.
    pub async fn leave(&self, handle: &Arc<ConnectionHandle>, room_id: RoomId) -> AppResult<()> {
        let room = match self.store.get(&room_id) {
            Ok(room) => room,
            // Room already gone — leaving is idempotent.
            Err(_) => {
                if handle.current_room() == Some(room_id) {
                    handle.take_room();
                    self.registry.unicast(&handle.user_id, ServerMessage::RoomLeft {});
                }
                return Ok(());
            }
        };

        let owner_leaving = {
            let guard = room.lock().await;
            guard.owner == handle.user_id
        };

        if owner_leaving {
            // An owner cannot leave a live room behind, so leaving closes it.
            self.close_room(room_id, Some(handle.user_id)).await?;
            return Ok(());
        }

        let broadcast = {
            let mut guard = room.lock().await;
            if !guard.remove_member(&handle.user_id) {
                None
            } else {
                guard.touch();
                Some((
                    guard.member_ids(),
                    ServerMessage::MemberLeft {
                        user_id: handle.user_id,
                        members: guard.member_entries(),
                    },
                ))
            }
        };

        let detached = handle.current_room() == Some(room_id);
        if detached {
            handle.take_room();
        }
        if detached || broadcast.is_some() {
            self.registry.unicast(&handle.user_id, ServerMessage::RoomLeft {});
        }

        if let Some((recipients, msg)) = broadcast {
            self.registry.broadcast(&recipients, &msg);
            info!(user_id = %handle.user_id, room_id = %room_id, "Member left room");
        }

        Ok(())
    }

    /// Cleans up after a transport drop. Never surfaces an error to anyone:
    /// other members simply observe a `member:left` (or, for the owner, a
    /// `room:updated` showing them offline — the room freezes rather than
    /// closing, so the owner can reconnect).
    pub async fn handle_disconnect(&self, handle: &Arc<ConnectionHandle>) {
        let Some(room_id) = handle.take_room() else {
            return;
        };
        let Ok(room) = self.store.get(&room_id) else {
            return;
        };

        let broadcast = {
            let mut guard = room.lock().await;
            if guard.owner == handle.user_id {
                // Freeze: the owner stays a member, flagged offline. The
                // janitor closes the room if nobody comes back.
                if let Some(member) = guard.member_mut(&handle.user_id) {
                    member.online = false;
                }
                guard.touch();
                warn!(room_id = %room_id, owner = %handle.user_id, "Owner disconnected, room frozen");
                Some((
                    guard.member_ids(),
                    ServerMessage::RoomUpdated {
                        room: guard.snapshot(),
                    },
                ))
            } else if guard.remove_member(&handle.user_id) {
                guard.touch();
                Some((
                    guard.member_ids(),
                    ServerMessage::MemberLeft {
                        user_id: handle.user_id,
                        members: guard.member_entries(),
                    },
                ))
            } else {
                None
            }
        };

        if let Some((recipients, msg)) = broadcast {
            self.registry.broadcast(&recipients, &msg);
        }
    }

    /// Kicks a member out of the requester's room. Owner only; the owner
    /// cannot be kicked.
    pub async fn kick(&self, handle: &Arc<ConnectionHandle>, target: UserId) -> AppResult<()> {
        let room_id = handle
            .current_room()
            .ok_or_else(|| AppError::not_found("Not currently in a room"))?;
        let room = self.store.get(&room_id)?;

        let (recipients, msg) = {
            let mut guard = room.lock().await;
            if guard.owner != handle.user_id {
                return Err(AppError::forbidden("Only the room owner can kick members"));
            }
            if target == guard.owner {
                return Err(AppError::forbidden("The room owner cannot be kicked"));
            }
            if !guard.remove_member(&target) {
                return Err(AppError::not_found(format!(
                    "User {target} is not a member of this room"
                )));
            }
            guard.touch();
            (
                guard.member_ids(),
                ServerMessage::MemberKicked {
                    user_id: target,
                    members: guard.member_entries(),
                },
            )
        };

        // Detach the kicked user server-side and tell only them.
        if let Some(target_handle) = self.registry.get_user(&target) {
            if target_handle.current_room() == Some(room_id) {
                target_handle.take_room();
            }
        }
        self.registry.unicast(&target, ServerMessage::RoomLeft {});
        self.registry.broadcast(&recipients, &msg);

        info!(room_id = %room_id, target = %target, by = %handle.user_id, "Member kicked");
        Ok(())
    }

    /// Mutes a member's chat. Owner only.
    pub async fn mute(
        &self,
        handle: &Arc<ConnectionHandle>,
        target: UserId,
        reason: Option<String>,
    ) -> AppResult<()> {
        self.set_muted(handle, target, true, reason).await
    }

    /// Lifts a member's mute. Owner only.
    pub async fn unmute(&self, handle: &Arc<ConnectionHandle>, target: UserId) -> AppResult<()> {
        self.set_muted(handle, target, false, None).await
    }

    async fn set_muted(
        &self,
        handle: &Arc<ConnectionHandle>,
        target: UserId,
        muted: bool,
        reason: Option<String>,
    ) -> AppResult<()> {
        let room_id = handle
            .current_room()
            .ok_or_else(|| AppError::not_found("Not currently in a room"))?;
        let room = self.store.get(&room_id)?;

        let (recipients, msg) = {
            let mut guard = room.lock().await;
            if guard.owner != handle.user_id {
                return Err(AppError::forbidden(
                    "Only the room owner can mute or unmute members",
                ));
            }
            let owner = guard.owner;
            let member = guard.member_mut(&target).ok_or_else(|| {
                AppError::not_found(format!("User {target} is not a member of this room"))
            })?;
            member.muted = muted;
            let msg = if muted {
                ServerMessage::MemberMuted {
                    user_id: target,
                    muted_by: owner,
                    reason,
                }
            } else {
                ServerMessage::MemberUnmuted { user_id: target }
            };
            guard.touch();
            (guard.member_ids(), msg)
        };

        self.registry.broadcast(&recipients, &msg);
        Ok(())
    }

    /// Closes a room: owner request, or system closure (janitor timeout)
    /// when `requester` is `None`. Broadcasts `room:closed`, evicts every
    /// member, and hands the room to the archive collaborator.
    pub async fn close_room(&self, room_id: RoomId, requester: Option<UserId>) -> AppResult<()> {
        // Authority check before the room becomes unreachable.
        {
            let room = self.store.get(&room_id)?;
            let guard = room.lock().await;
            if let Some(user) = requester {
                if user != guard.owner {
                    return Err(AppError::forbidden("Only the room owner can close the room"));
                }
            }
        }

        let room = self
            .store
            .detach(&room_id)
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;

        let members = {
            let guard = room.lock().await;
            guard.member_ids()
        };

        self.registry.broadcast(&members, &ServerMessage::RoomClosed {});
        for user_id in &members {
            if let Some(member_handle) = self.registry.get_user(user_id) {
                if member_handle.current_room() == Some(room_id) {
                    member_handle.take_room();
                }
            }
        }

        self.store.destroy(&room).await;
        info!(room_id = %room_id, by_owner = requester.is_some(), "Room closed");
        Ok(())
    }
}
