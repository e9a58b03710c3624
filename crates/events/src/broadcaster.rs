//! Location-partitioned subscriber registry with best-effort fan-out.
//!
//! Each dashboard connection subscribes to exactly one location. A broadcast
//! snapshots that location's subscriber set, delivers to every connection
//! concurrently with a bounded per-connection timeout, and prunes the ones
//! that failed once the delivery pass is over.
//!
//! [`Broadcaster`] is designed to be shared via `Arc<Broadcaster>` between
//! telemetry handlers, the state registry and the WebSocket endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use floodwatch_core::types::{LocationId, Timestamp};
use futures::future::join_all;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::envelope::Envelope;

/// Default bound on a single subscriber send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Unique connection identifier (UUID string).
pub type ConnId = String;

/// A frame queued for one subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Serialized [`Envelope`].
    Text(Arc<str>),
    Ping,
    Close,
}

/// Lifecycle of a subscriber connection. One-way: a closed connection is
/// pruned and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Why a single delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendFailure {
    #[error("connection closed")]
    Closed,
    #[error("send timed out")]
    TimedOut,
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Sending half of one subscriber.
///
/// The matching receiver is drained by whoever owns the transport (the
/// WebSocket sender task). Dropping the receiver closes the connection.
/// When the broadcaster drops a connection it cancels the token returned by
/// [`Connection::eviction`]; the transport owner must then close the socket,
/// since a full queue may never carry a Close frame.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnId,
    sender: mpsc::Sender<Outbound>,
    connected_at: Timestamp,
    evicted: CancellationToken,
}

impl Connection {
    /// Create a connection with a bounded outbound queue.
    pub fn channel(id: impl Into<ConnId>, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: id.into(),
            sender,
            connected_at: chrono::Utc::now(),
            evicted: CancellationToken::new(),
        };
        (conn, receiver)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Cancelled once the broadcaster has pruned or shut down this connection.
    pub fn eviction(&self) -> CancellationToken {
        self.evicted.clone()
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    pub fn state(&self) -> ConnectionState {
        if self.sender.is_closed() || self.evicted.is_cancelled() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    /// Queue a frame, waiting at most `timeout` for queue space.
    pub async fn send(&self, frame: Outbound, timeout: Duration) -> Result<(), SendFailure> {
        match tokio::time::timeout(timeout, self.sender.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendFailure::Closed),
            Err(_) => Err(SendFailure::TimedOut),
        }
    }

    fn same_channel(&self, other: &Connection) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

// ---------------------------------------------------------------------------
// Broadcaster
// ---------------------------------------------------------------------------

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub pruned: usize,
}

type SubscriberSet = HashMap<ConnId, Connection>;

/// Per-location subscriber sets.
pub struct Broadcaster {
    locations: RwLock<HashMap<LocationId, SubscriberSet>>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            locations: RwLock::new(HashMap::new()),
            send_timeout,
        }
    }

    /// Add a connection to a location's subscriber set.
    ///
    /// Re-subscribing an id replaces the previous connection.
    pub async fn subscribe(&self, connection: Connection, location_id: LocationId) {
        let conn_id = connection.id.clone();
        let count = {
            let mut locations = self.locations.write().await;
            let set = locations.entry(location_id).or_default();
            set.insert(conn_id.clone(), connection);
            set.len()
        };
        tracing::info!(conn_id = %conn_id, location_id = %location_id, subscribers = count, "Subscriber added");
    }

    /// Remove a connection. Empty sets are dropped.
    pub async fn unsubscribe(&self, conn_id: &str, location_id: LocationId) {
        let mut locations = self.locations.write().await;
        if let Some(set) = locations.get_mut(&location_id) {
            if set.remove(conn_id).is_some() {
                tracing::info!(conn_id = %conn_id, location_id = %location_id, "Subscriber removed");
            }
            if set.is_empty() {
                locations.remove(&location_id);
            }
        }
    }

    /// Deliver `message` to every current subscriber of `location_id`.
    ///
    /// Works on a snapshot of the set, so concurrent subscribe/unsubscribe is
    /// safe. Failed or closed connections are removed after the pass; a
    /// failure never affects delivery to the others and is never returned
    /// to the caller.
    pub async fn broadcast(&self, location_id: LocationId, message: Arc<str>) -> DeliveryReport {
        let snapshot: Vec<Connection> = {
            let locations = self.locations.read().await;
            match locations.get(&location_id) {
                Some(set) => set.values().cloned().collect(),
                None => return DeliveryReport::default(),
            }
        };

        let frame = Outbound::Text(message);
        let results = join_all(snapshot.iter().map(|conn| {
            let frame = frame.clone();
            async move {
                if conn.state() == ConnectionState::Closed {
                    return Err(SendFailure::Closed);
                }
                conn.send(frame, self.send_timeout).await
            }
        }))
        .await;

        let mut dead = Vec::new();
        for (conn, result) in snapshot.iter().zip(results) {
            if let Err(failure) = result {
                tracing::debug!(
                    conn_id = %conn.id,
                    location_id = %location_id,
                    error = %failure,
                    "Subscriber delivery failed, pruning"
                );
                dead.push(conn);
            }
        }

        let report = DeliveryReport {
            delivered: snapshot.len() - dead.len(),
            pruned: dead.len(),
        };
        if !dead.is_empty() {
            self.prune(location_id, &dead).await;
        }
        report
    }

    /// Serialize and broadcast an envelope.
    pub async fn publish(&self, location_id: LocationId, envelope: &Envelope) -> DeliveryReport {
        self.broadcast(location_id, Arc::from(envelope.to_text())).await
    }

    /// Number of subscribers currently registered for a location.
    pub async fn subscriber_count(&self, location_id: LocationId) -> usize {
        self.locations
            .read()
            .await
            .get(&location_id)
            .map_or(0, HashMap::len)
    }

    /// Number of locations with at least one subscriber.
    pub async fn location_count(&self) -> usize {
        self.locations.read().await.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.locations.read().await.values().map(HashMap::len).sum()
    }

    /// Queue a Ping on every connection.
    ///
    /// Never waits: a full queue skips this round, a closed one is pruned.
    pub async fn ping_all(&self) {
        let mut closed: Vec<(LocationId, Connection)> = Vec::new();
        {
            let locations = self.locations.read().await;
            for (location_id, set) in locations.iter() {
                for conn in set.values() {
                    if let Err(mpsc::error::TrySendError::Closed(_)) =
                        conn.sender.try_send(Outbound::Ping)
                    {
                        closed.push((*location_id, conn.clone()));
                    }
                }
            }
        }
        for (location_id, conn) in closed {
            self.prune(location_id, &[&conn]).await;
        }
    }

    /// Send Close to every connection, then clear all sets.
    pub async fn shutdown_all(&self) {
        let mut locations = self.locations.write().await;
        let count: usize = locations.values().map(HashMap::len).sum();
        for conn in locations.values().flat_map(HashMap::values) {
            let _ = conn.sender.try_send(Outbound::Close);
            conn.evicted.cancel();
        }
        locations.clear();
        tracing::info!(count, "Closed all subscriber connections");
    }

    /// Remove the given connections, unless their id has since been
    /// re-subscribed with a different channel, and signal eviction to each
    /// one removed.
    async fn prune(&self, location_id: LocationId, dead: &[&Connection]) {
        let mut locations = self.locations.write().await;
        let Some(set) = locations.get_mut(&location_id) else {
            return;
        };
        for conn in dead {
            if set.get(&conn.id).is_some_and(|current| current.same_channel(conn)) {
                if let Some(removed) = set.remove(&conn.id) {
                    let _ = removed.sender.try_send(Outbound::Close);
                    removed.evicted.cancel();
                }
            }
        }
        if set.is_empty() {
            locations.remove(&location_id);
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
