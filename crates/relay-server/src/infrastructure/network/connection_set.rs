//! ConnectionSet: the authoritative collection of live accepted connections.
//!
//! The multiplex loop owns exactly one `ConnectionSet`.  Every accepted
//! socket lives here from registration until its disconnection is detected or
//! the shutdown broadcast drains the set.  The listening socket is not a
//! member; it is monitored alongside the set in the same readiness wait and
//! stays open for the whole server lifetime.
//!
//! # Ordering
//!
//! Membership is a `BTreeMap` keyed by [`ConnectionId`], so every scan runs
//! in ascending identifier order.  Identifiers come from a per-set monotonic
//! counter and are never reused within a server instance, which makes the
//! dispatch order deterministic without tying it to how the OS numbers its
//! socket resources.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use futures::future::select_all;
use tokio::net::TcpStream;

/// Process-unique identifier for one accepted connection.
///
/// Stable for the connection's lifetime; no two live connections share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One live accepted connection.
///
/// The remote endpoint is captured at accept time and never changes.
/// Dropping the connection releases the underlying socket.
#[derive(Debug)]
pub struct RelayConnection {
    pub id: ConnectionId,
    pub peer_addr: SocketAddr,
    pub stream: TcpStream,
}

/// Ordered set of live connections watched by the multiplex loop.
#[derive(Debug)]
pub struct ConnectionSet {
    connections: BTreeMap<ConnectionId, RelayConnection>,
    next_id: u64,
    max_connections: usize,
}

impl ConnectionSet {
    /// Creates an empty set with an explicit ceiling on concurrent members.
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: BTreeMap::new(),
            next_id: 0,
            max_connections,
        }
    }

    /// Registers a freshly accepted socket and returns its new identifier.
    ///
    /// Callers enforce the capacity policy via [`ConnectionSet::is_full`];
    /// registration itself never fails.
    pub fn register(&mut self, stream: TcpStream, peer_addr: SocketAddr) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.insert(
            id,
            RelayConnection {
                id,
                peer_addr,
                stream,
            },
        );
        id
    }

    /// Unregisters a connection, returning it so the caller decides how the
    /// socket is released.
    ///
    /// Removing an identifier that is already absent is a no-op, never an
    /// error: disconnects can be detected twice in edge timing.
    pub fn remove(&mut self, id: ConnectionId) -> Option<RelayConnection> {
        self.connections.remove(&id)
    }

    /// Returns the connection for `id`, if it is still a member.
    pub fn get(&self, id: ConnectionId) -> Option<&RelayConnection> {
        self.connections.get(&id)
    }

    /// Whether `id` is currently a member.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Snapshot of all member identifiers in ascending order.
    ///
    /// Dispatch passes iterate this snapshot and re-look up each identifier,
    /// so a member removed earlier in the same pass is skipped instead of
    /// read through.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Iterates all members in ascending identifier order.
    pub fn members(&self) -> impl Iterator<Item = &RelayConnection> {
        self.connections.values()
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Whether the set has reached its configured ceiling.
    pub fn is_full(&self) -> bool {
        self.connections.len() >= self.max_connections
    }

    /// Removes and returns every member, in ascending identifier order.
    ///
    /// Used by the shutdown broadcast: the set logically empties while the
    /// caller iterates the drained connections.
    pub fn drain(&mut self) -> Vec<RelayConnection> {
        std::mem::take(&mut self.connections).into_values().collect()
    }

    /// Blocks until at least one member has data (or end-of-stream) to read,
    /// returning that member's identifier.
    ///
    /// With no members the future never resolves, leaving the loop blocked on
    /// its other wait branches.  A readiness error is not reported here; it
    /// surfaces on the subsequent `try_read` of the affected member.
    pub async fn readable(&self) -> ConnectionId {
        if self.connections.is_empty() {
            return std::future::pending::<ConnectionId>().await;
        }

        let waits = self
            .connections
            .values()
            .map(|conn| {
                Box::pin(async move {
                    let _ = conn.stream.readable().await;
                    conn.id
                })
            })
            .collect::<Vec<_>>();

        let (id, _, _) = select_all(waits).await;
        id
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
