//! # cinesync-api
//!
//! HTTP layer for CineSync built on Axum.
//!
//! Provides the `/ws` WebSocket upgrade (authenticated before upgrade),
//! health endpoints, CORS and tracing layers, and the `AppError` → HTTP
//! response mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
