//! Room state — the authoritative aggregate, its store, bounded history,
//! and the abandoned-room janitor.

pub mod history;
pub mod janitor;
pub mod room;
pub mod store;

pub use history::BoundedRing;
pub use room::Room;
pub use store::RoomStore;
