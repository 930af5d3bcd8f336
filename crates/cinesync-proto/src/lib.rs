//! # cinesync-proto
//!
//! The CineSync wire protocol: JSON events exchanged over one WebSocket
//! per user, plus the shared data model both sides reconcile against.
//!
//! Events are internally tagged (`"type"` field) with the platform's
//! `domain:action` names, e.g. `{"type": "video:play", "currentTime": 120.5}`.

pub mod message;
pub mod state;

pub use message::{ClientMessage, ServerMessage};
pub use state::{ChatMessage, EmojiEvent, MemberEntry, RoomSnapshot, RoomStatus, SyncState};
