//! Event hub: process-local fan-out of domain events to viewer connections.
//!
//! One hub is created at startup and shut down on stop. Publishes are
//! serialized through the connection table lock, so every viewer sees events
//! in `publish` call order. Delivery is best effort: no replay, no
//! persistence, a closed receiver is pruned on the next publish.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::DomainEvent;
use crate::metrics::mutations::{EVENTS_PUBLISHED_TOTAL, EVENT_DELIVERIES_TOTAL, VIEWER_CONNECTIONS};

/// Connection ID type for uniquely identifying viewer connections
pub type ConnectionId = Uuid;

struct ViewerConnection {
    viewer: Option<Uuid>,
    sender: UnboundedSender<Arc<DomainEvent>>,
    connected_at: DateTime<Utc>,
}

/// Receiving side handed to a connection.
pub struct Subscription {
    pub connection_id: ConnectionId,
    pub receiver: UnboundedReceiver<Arc<DomainEvent>>,
}

#[derive(Default)]
pub struct EventHub {
    connections: Mutex<HashMap<ConnectionId, ViewerConnection>>,
    closed: AtomicBool,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. After `shutdown` the returned receiver is
    /// already closed.
    pub async fn subscribe(&self, viewer: Option<Uuid>) -> Subscription {
        let connection_id = Uuid::new_v4();
        let (sender, receiver) = unbounded_channel();

        let mut connections = self.connections.lock().await;
        if self.closed.load(Ordering::Acquire) {
            debug!(%connection_id, "Hub closed, subscription dropped");
            return Subscription {
                connection_id,
                receiver,
            };
        }

        connections.insert(
            connection_id,
            ViewerConnection {
                viewer,
                sender,
                connected_at: Utc::now(),
            },
        );
        VIEWER_CONNECTIONS.set(connections.len() as i64);
        debug!(%connection_id, viewer = ?viewer, "Viewer subscribed");

        Subscription {
            connection_id,
            receiver,
        }
    }

    /// Returns true if the connection was registered.
    pub async fn unsubscribe(&self, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(&connection_id);
        VIEWER_CONNECTIONS.set(connections.len() as i64);

        if let Some(conn) = &removed {
            let connected_for = Utc::now() - conn.connected_at;
            debug!(
                %connection_id,
                viewer = ?conn.viewer,
                connected_secs = connected_for.num_seconds(),
                "Viewer unsubscribed"
            );
        }
        removed.is_some()
    }

    /// Deliver `event` to every live connection. Returns how many received it.
    pub async fn publish(&self, event: DomainEvent) -> usize {
        let kind = event.kind();
        let event = Arc::new(event);

        let mut connections = self.connections.lock().await;
        let mut delivered = 0;
        let mut dead = Vec::new();

        for (id, conn) in connections.iter() {
            if conn.sender.send(Arc::clone(&event)).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }

        for id in &dead {
            connections.remove(id);
        }
        if !dead.is_empty() {
            VIEWER_CONNECTIONS.set(connections.len() as i64);
            debug!(pruned = dead.len(), "Pruned closed viewer connections");
        }
        drop(connections);

        EVENTS_PUBLISHED_TOTAL.with_label_values(&[kind]).inc();
        EVENT_DELIVERIES_TOTAL
            .with_label_values(&[kind])
            .inc_by(delivered as u64);
        debug!(kind, delivered, "Event published");

        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Drop every connection; their receivers end, which ends the sessions.
    pub async fn shutdown(&self) {
        let mut connections = self.connections.lock().await;
        self.closed.store(true, Ordering::Release);
        let count = connections.len();
        connections.clear();
        VIEWER_CONNECTIONS.set(0);
        info!(connections = count, "Event hub shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
