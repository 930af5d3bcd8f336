//! Presence and membership transitions.

pub mod manager;

pub use manager::PresenceManager;
