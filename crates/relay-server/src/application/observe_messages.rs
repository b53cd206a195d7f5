//! MessageLog: console observation of relay traffic.
//!
//! The relay is receive-and-log: the only thing the server does with a
//! payload is print it.  `MessageLog` produces that output (new connections
//! with their endpoint, received message contents, disconnections, shutdown
//! progress) and keeps running counters.  It is fed plain data by the
//! binary's event pump and never touches a socket, which keeps it unit
//! testable without any network setup.

use std::net::SocketAddr;

use tracing::{info, warn};

/// Renders a received payload for the console.
///
/// The wire payload stays opaque; this shaping is for logging only.  The
/// bytes are cut at the first NUL, converted lossily to UTF-8, and stripped
/// of the trailing line break the sender's console usually appends.
pub fn message_preview(payload: &[u8]) -> String {
    let end = payload
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end])
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Console log of everything the relay observes.
#[derive(Debug, Default)]
pub struct MessageLog {
    connections_seen: u64,
    messages_seen: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a newly accepted connection with its remote endpoint.
    pub fn peer_connected(&mut self, peer_addr: SocketAddr) {
        self.connections_seen += 1;
        info!("new connection: {peer_addr}");
    }

    /// Logs one received payload.
    pub fn message_received(&mut self, peer_addr: SocketAddr, payload: &[u8]) {
        self.messages_seen += 1;
        info!("received from {peer_addr}: {}", message_preview(payload));
    }

    /// Logs a detected disconnection.
    pub fn peer_disconnected(&mut self, peer_addr: SocketAddr) {
        info!("client {peer_addr} disconnected");
    }

    /// Logs a connection refused at the configured ceiling.
    pub fn connection_refused(&mut self, peer_addr: SocketAddr) {
        warn!("refused connection from {peer_addr}: connection limit reached");
    }

    /// Logs the completed shutdown broadcast.
    pub fn shutdown_broadcast(&mut self, notified: usize) {
        info!("shutdown notice sent to {notified} connection(s)");
    }

    /// Total connections observed since startup.
    pub fn connections_seen(&self) -> u64 {
        self.connections_seen
    }

    /// Total payloads observed since startup.
    pub fn messages_seen(&self) -> u64 {
        self.messages_seen
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
