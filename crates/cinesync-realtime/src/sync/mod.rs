//! Playback synchronization — the owner-authoritative sync engine and the
//! periodic drift-correction ticker.

pub mod engine;
pub mod ticker;

pub use engine::SyncEngine;
