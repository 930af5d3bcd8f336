//! Messaging relay — chat and emoji fan-out with bounded history.
//!
//! Chat is best-effort and never blocks playback sync: fan-out uses the
//! same drop-if-backpressured per-connection sends as everything else.

use std::sync::Arc;

use chrono::Utc;

use cinesync_core::config::realtime::RealtimeConfig;
use cinesync_core::error::AppError;
use cinesync_core::result::AppResult;
use cinesync_core::types::id::MessageId;
use cinesync_proto::{ChatMessage, EmojiEvent, ServerMessage};

use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::room::store::RoomStore;

/// Longest accepted emoji payload, in characters. Enough for a glyph with
/// modifiers, far too short for smuggled chat.
const MAX_EMOJI_CHARS: usize = 8;

/// Relays chat messages and emoji reactions to room members.
#[derive(Debug)]
pub struct MessageRelay {
    /// Room state store.
    store: Arc<RoomStore>,
    /// Connection registry for fan-out.
    registry: Arc<ConnectionRegistry>,
    /// Engine configuration (message length bound).
    config: RealtimeConfig,
}

impl MessageRelay {
    /// Creates a new relay.
    pub fn new(
        store: Arc<RoomStore>,
        registry: Arc<ConnectionRegistry>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Sends a chat message to the sender's room.
    ///
    /// `Validation` for empty or oversize text; `Forbidden` when the
    /// sender is muted or not a member. Accepted messages enter the
    /// bounded history ring and fan out to every member.
    pub async fn send_message(&self, handle: &Arc<ConnectionHandle>, text: &str) -> AppResult<()> {
        if text.trim().is_empty() {
            return Err(AppError::validation("Message text is empty"));
        }
        if text.chars().count() > self.config.max_message_len {
            return Err(AppError::validation(format!(
                "Message exceeds {} characters",
                self.config.max_message_len
            )));
        }

        let room_id = handle
            .current_room()
            .ok_or_else(|| AppError::not_found("Not currently in a room"))?;
        let room = self.store.get(&room_id)?;

        let (recipients, msg) = {
            let mut guard = room.lock().await;
            let member = guard
                .member(&handle.user_id)
                .ok_or_else(|| AppError::forbidden("Not a member of this room"))?;
            if member.muted {
                return Err(AppError::forbidden("You are muted in this room"));
            }

            let message = ChatMessage {
                id: MessageId::new(),
                user_id: handle.user_id,
                username: member.username.clone(),
                text: text.to_string(),
                sent_at: Utc::now(),
            };
            guard.messages.push(message.clone());
            guard.touch();
            (
                guard.member_ids(),
                ServerMessage::RoomMessage { msg: message },
            )
        };

        self.registry.broadcast(&recipients, &msg);
        Ok(())
    }

    /// Sends an emoji reaction to the sender's room. Same membership and
    /// mute checks as chat; retained only in the short ephemeral ring.
    pub async fn send_emoji(&self, handle: &Arc<ConnectionHandle>, emoji: &str) -> AppResult<()> {
        if emoji.trim().is_empty() {
            return Err(AppError::validation("Emoji is empty"));
        }
        if emoji.chars().count() > MAX_EMOJI_CHARS {
            return Err(AppError::validation("Emoji payload too long"));
        }

        let room_id = handle
            .current_room()
            .ok_or_else(|| AppError::not_found("Not currently in a room"))?;
        let room = self.store.get(&room_id)?;

        let (recipients, msg) = {
            let mut guard = room.lock().await;
            let member = guard
                .member(&handle.user_id)
                .ok_or_else(|| AppError::forbidden("Not a member of this room"))?;
            if member.muted {
                return Err(AppError::forbidden("You are muted in this room"));
            }

            let event = EmojiEvent {
                user_id: handle.user_id,
                username: member.username.clone(),
                emoji: emoji.to_string(),
                sent_at: Utc::now(),
            };
            guard.emoji.push(event.clone());
            guard.touch();
            (guard.member_ids(), ServerMessage::RoomEmoji { emoji: event })
        };

        self.registry.broadcast(&recipients, &msg);
        Ok(())
    }
}
