//! Movie catalog collaborator interface.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::id::MovieId;
use crate::types::movie::MovieInfo;

/// Trait for the external movie-metadata service.
///
/// The real implementation talks to the platform's catalog; the engine
/// only needs duration and stream URL at room creation.
#[async_trait]
pub trait MovieCatalog: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a movie by id. `NotFound` if the catalog does not know it.
    async fn lookup(&self, id: MovieId) -> AppResult<MovieInfo>;
}

/// In-memory catalog for tests and standalone runs.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    movies: RwLock<HashMap<MovieId, MovieInfo>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a movie.
    pub fn insert(&self, movie: MovieInfo) {
        self.movies
            .write()
            .expect("catalog lock poisoned")
            .insert(movie.id, movie);
    }
}

#[async_trait]
impl MovieCatalog for InMemoryCatalog {
    async fn lookup(&self, id: MovieId) -> AppResult<MovieInfo> {
        self.movies
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Movie {id} not in catalog")))
    }
}
