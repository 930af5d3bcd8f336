//! Connection registry — one live connection per authenticated user.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use cinesync_core::types::id::UserId;
use cinesync_proto::ServerMessage;

use crate::metrics::EngineMetrics;

use super::handle::{ConnectionHandle, ConnectionId};

/// Tracks all active connections, indexed both by connection id and by
/// user id.
///
/// Exactly one connection is live per user: registering a user who already
/// has one supersedes the old connection, which is returned to the caller
/// so its room membership can be torn down before the new connection does
/// anything.
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Connection ID → handle.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// User ID → their single live connection.
    by_user: DashMap<UserId, ConnectionId>,
    /// Per-connection outbound buffer size.
    buffer_size: usize,
    /// Shared counters.
    metrics: Arc<EngineMetrics>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new(buffer_size: usize, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            by_id: DashMap::new(),
            by_user: DashMap::new(),
            buffer_size,
            metrics,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Returns the handle, the receiver end of its outbound buffer, and the
    /// superseded handle if this user already had a live connection. The
    /// superseded handle is already marked dead and removed from the
    /// registry; the caller must tear down its room membership.
    pub fn register(
        &self,
        user_id: UserId,
        username: String,
    ) -> (
        Arc<ConnectionHandle>,
        mpsc::Receiver<ServerMessage>,
        Option<Arc<ConnectionHandle>>,
    ) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id, username, tx));

        let superseded = self
            .by_user
            .insert(user_id, handle.id)
            .and_then(|old_id| self.by_id.remove(&old_id))
            .map(|(_, old)| {
                warn!(
                    user_id = %user_id,
                    old_conn = %old.id,
                    new_conn = %handle.id,
                    "Reconnect supersedes existing connection"
                );
                old.mark_dead();
                old
            });

        self.by_id.insert(handle.id, handle.clone());
        self.metrics.connection_opened();

        info!(conn_id = %handle.id, user_id = %user_id, "Connection registered");

        (handle, rx, superseded)
    }

    /// Unregisters a connection. Idempotent; returns the handle if it was
    /// still registered so downstream presence cleanup can run.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        handle.mark_dead();

        // Only clear the user index if it still points at this connection;
        // a reconnect may have superseded it already.
        self.by_user
            .remove_if(&handle.user_id, |_, current| *current == *conn_id);

        self.metrics.connection_closed();
        info!(conn_id = %conn_id, user_id = %handle.user_id, "Connection unregistered");

        Some(handle)
    }

    /// Gets a connection by id.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets a user's live connection, if any.
    pub fn get_user(&self, user_id: &UserId) -> Option<Arc<ConnectionHandle>> {
        let conn_id = *self.by_user.get(user_id)?;
        self.get(&conn_id)
    }

    /// Whether the user currently has a live connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.get_user(user_id).is_some_and(|h| h.is_alive())
    }

    /// Sends an event to one user, if connected.
    pub fn unicast(&self, user_id: &UserId, msg: ServerMessage) {
        if let Some(handle) = self.get_user(user_id) {
            if handle.send(msg) {
                self.metrics.message_sent();
            } else {
                self.metrics.message_dropped();
            }
        }
    }

    /// Fans an event out to a set of users. Best-effort per connection:
    /// offline users are skipped, backpressured ones dropped.
    pub fn broadcast(&self, user_ids: &[UserId], msg: &ServerMessage) {
        for user_id in user_ids {
            if let Some(handle) = self.get_user(user_id) {
                if handle.send(msg.clone()) {
                    self.metrics.message_sent();
                } else {
                    self.metrics.message_dropped();
                }
            }
        }
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }
}
