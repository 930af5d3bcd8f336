//! Movie metadata as supplied by the external catalog collaborator.

use serde::{Deserialize, Serialize};

use super::id::MovieId;

/// Metadata for one movie, looked up at room creation.
///
/// The sync engine uses `duration_seconds` to bound playback positions;
/// clients use `stream_url` to source the actual video feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    /// Catalog identifier.
    pub id: MovieId,
    /// Display title.
    pub title: String,
    /// Total runtime in seconds.
    pub duration_seconds: f64,
    /// Where clients fetch the stream from.
    pub stream_url: String,
}
