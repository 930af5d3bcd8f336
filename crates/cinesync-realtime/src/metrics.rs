//! Engine-level metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters for the real-time engine.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total events sent to clients.
    messages_sent: AtomicU64,
    /// Total events received from clients.
    messages_received: AtomicU64,
    /// Events dropped due to per-connection backpressure.
    messages_dropped: AtomicU64,
    /// Connections ever established.
    connections_total: AtomicU64,
    /// Currently active connections.
    connections_active: AtomicU64,
    /// Rooms ever created.
    rooms_created: AtomicU64,
    /// Rooms closed.
    rooms_closed: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event sent to a client.
    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event received from a client.
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event dropped for a backpressured connection.
    pub fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection opening.
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closing.
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a room creation.
    pub fn room_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a room closure.
    pub fn room_closed(&self) {
        self.rooms_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_closed: self.rooms_closed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total events sent.
    pub messages_sent: u64,
    /// Total events received.
    pub messages_received: u64,
    /// Events dropped on backpressure.
    pub messages_dropped: u64,
    /// Connections ever established.
    pub connections_total: u64,
    /// Currently active connections.
    pub connections_active: u64,
    /// Rooms ever created.
    pub rooms_created: u64,
    /// Rooms closed.
    pub rooms_closed: u64,
}
