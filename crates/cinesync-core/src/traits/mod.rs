//! Core traits defined in `cinesync-core` and implemented by external
//! collaborators (or their in-memory stand-ins).

pub mod archive;
pub mod catalog;

pub use archive::{ClosedRoomRecord, NoopArchive, RoomArchive};
pub use catalog::{InMemoryCatalog, MovieCatalog};
