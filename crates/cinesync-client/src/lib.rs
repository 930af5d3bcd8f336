//! # cinesync-client
//!
//! Client adapter for the CineSync watch-party protocol.
//!
//! Provides a WebSocket session that speaks the wire protocol, a jittered
//! exponential reconnect backoff, and a pure reducer that folds server
//! events into a local view of the room. The reducer never extrapolates
//! state the server has not confirmed; between `video:sync` broadcasts the
//! playhead is derived from the last canonical state plus wall-clock time.

pub mod backoff;
pub mod reducer;
pub mod session;

pub use backoff::ReconnectBackoff;
pub use reducer::ClientRoomState;
pub use session::{ClientSession, SessionEvent};
