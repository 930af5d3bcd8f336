//! Shared domain types.

pub mod id;
pub mod movie;

pub use id::{MessageId, MovieId, RoomId, UserId};
pub use movie::MovieInfo;
