//! Real-time sync engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the watch-party real-time engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound buffer size. When a member's buffer fills,
    /// further messages to that member are dropped, never queued room-wide.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// WebSocket pong timeout in seconds.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Interval between `video:sync` drift-correction broadcasts while a
    /// room is playing.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
    /// How long a room may sit with no online members before the janitor
    /// closes it.
    #[serde(default = "default_room_empty_timeout")]
    pub room_empty_timeout_seconds: u64,
    /// How often the janitor sweeps for abandoned rooms.
    #[serde(default = "default_janitor_interval")]
    pub janitor_interval_seconds: u64,
    /// Upper bound accepted for a room's `max_members`.
    #[serde(default = "default_max_members_ceiling")]
    pub max_members_ceiling: usize,
    /// Chat messages retained per room (FIFO eviction).
    #[serde(default = "default_chat_history")]
    pub chat_history: usize,
    /// Emoji events retained per room (FIFO eviction).
    #[serde(default = "default_emoji_history")]
    pub emoji_history: usize,
    /// Maximum chat message length in characters.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            sync_interval_seconds: default_sync_interval(),
            room_empty_timeout_seconds: default_room_empty_timeout(),
            janitor_interval_seconds: default_janitor_interval(),
            max_members_ceiling: default_max_members_ceiling(),
            chat_history: default_chat_history(),
            emoji_history: default_emoji_history(),
            max_message_len: default_max_message_len(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    10
}

fn default_sync_interval() -> u64 {
    10
}

fn default_room_empty_timeout() -> u64 {
    300
}

fn default_janitor_interval() -> u64 {
    30
}

fn default_max_members_ceiling() -> usize {
    50
}

fn default_chat_history() -> usize {
    200
}

fn default_emoji_history() -> usize {
    50
}

fn default_max_message_len() -> usize {
    500
}
