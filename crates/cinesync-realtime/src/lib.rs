//! # cinesync-realtime
//!
//! The watch-party coordination core. Provides:
//!
//! - Connection registry: one authenticated WebSocket per user, with
//!   supersede-on-reconnect and heartbeat keepalive
//! - Room state store: authoritative in-memory rooms, serialized per-room
//! - Sync engine: owner-authoritative play/pause/seek plus periodic
//!   drift-correction broadcasts
//! - Presence manager: join/leave/kick/mute with full-member-list deltas
//! - Messaging relay: bounded chat and emoji fan-out

pub mod connection;
pub mod metrics;
pub mod presence;
pub mod relay;
pub mod room;
pub mod server;
pub mod sync;

pub use connection::registry::ConnectionRegistry;
pub use metrics::EngineMetrics;
pub use presence::manager::PresenceManager;
pub use relay::MessageRelay;
pub use room::store::RoomStore;
pub use server::RealtimeEngine;
pub use sync::engine::SyncEngine;
