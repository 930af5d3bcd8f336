//! Application state shared across all handlers.

use std::sync::Arc;

use cinesync_core::config::AppConfig;
use cinesync_realtime::connection::authenticator::WsAuthenticator;
use cinesync_realtime::server::RealtimeEngine;

/// Shared dependencies passed to every handler via `State<AppState>`.
///
/// Cheap to clone; all fields are `Arc`-wrapped or internally shared.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The watch-party real-time engine.
    pub engine: RealtimeEngine,
    /// Token authenticator for WebSocket upgrades.
    pub authenticator: Arc<WsAuthenticator>,
}

impl AppState {
    /// Assembles the application state.
    pub fn new(
        config: Arc<AppConfig>,
        engine: RealtimeEngine,
        authenticator: Arc<WsAuthenticator>,
    ) -> Self {
        Self {
            config,
            engine,
            authenticator,
        }
    }
}
