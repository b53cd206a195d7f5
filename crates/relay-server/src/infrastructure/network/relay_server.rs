//! RelayServer: the listener, the multiplex loop, and the shutdown broadcast.
//!
//! The server is single-threaded and cooperative: one task owns the listener
//! and the [`ConnectionSet`], and each cycle blocks on exactly one combined
//! readiness wait covering the shutdown signal, the listener, and every
//! accepted socket.  All socket work (accept, bounded read, notice send,
//! close, set mutation) happens between two waits, so no two reads, and no
//! accept and read, ever run concurrently.
//!
//! The shutdown trigger is a `watch` channel injected into the wait itself.
//! When it fires the loop exits and never dispatches again; the broadcast
//! therefore runs strictly between dispatch passes and needs no locking
//! around the connection set.
//!
//! Observational output leaves the loop as [`ServerEvent`]s on an `mpsc`
//! channel, consumed by the binary's event pump (and by integration tests).

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use relay_core::SHUTDOWN_NOTICE;

use super::connection_set::{ConnectionId, ConnectionSet};
use crate::infrastructure::storage::config::NetworkConfig;

/// Error type for server setup.  All variants are fatal: they occur before
/// the multiplex loop starts and abort startup with a diagnostic.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create listening socket: {0}")]
    Socket(#[source] std::io::Error),
    #[error("invalid bind address {addr:?}: {source}")]
    InvalidBindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("listen failed on {addr}: {source}")]
    ListenFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Why a connection left the active set.
#[derive(Debug)]
pub enum DisconnectReason {
    /// The peer shut its end down (zero-length read).
    PeerClosed,
    /// A read failed with a hard I/O error.
    ReadFailed(std::io::Error),
}

/// Events emitted by the relay server to the application layer.
#[derive(Debug)]
pub enum ServerEvent {
    /// A new connection was accepted and registered.
    PeerConnected {
        id: ConnectionId,
        peer_addr: SocketAddr,
    },
    /// One bounded read delivered an opaque payload.
    ///
    /// There is no framing: the payload may be a partial logical message or
    /// several coalesced ones.
    MessageReceived {
        id: ConnectionId,
        peer_addr: SocketAddr,
        payload: Vec<u8>,
    },
    /// A connection was detected as gone and removed from the set.
    PeerDisconnected {
        id: ConnectionId,
        peer_addr: SocketAddr,
        reason: DisconnectReason,
    },
    /// An accepted connection was refused because the set is at capacity.
    ConnectionRefused { peer_addr: SocketAddr, active: usize },
    /// The shutdown broadcast completed; `notified` connections were sent the
    /// notice and closed.
    ShutdownBroadcast { notified: usize },
}

/// What woke the multiplex loop this cycle.
enum Wakeup {
    Shutdown,
    Incoming(std::io::Result<(TcpStream, SocketAddr)>),
    Readable,
}

/// The relay server: one listener plus the set of live connections.
pub struct RelayServer {
    listener: TcpListener,
    connections: ConnectionSet,
    recv_buffer_len: usize,
    event_tx: mpsc::Sender<ServerEvent>,
}

impl RelayServer {
    /// Binds the listener and returns the server together with the event
    /// receiver.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] when the bind address is not IPv4, or when
    /// socket creation, bind, or listen fails.  These are fatal at startup.
    pub async fn bind(
        config: &NetworkConfig,
    ) -> Result<(Self, mpsc::Receiver<ServerEvent>), ServerError> {
        let ip: Ipv4Addr =
            config
                .bind_address
                .parse()
                .map_err(|source| ServerError::InvalidBindAddress {
                    addr: config.bind_address.clone(),
                    source,
                })?;
        let addr = SocketAddr::from((ip, config.listen_port));

        let socket = TcpSocket::new_v4().map_err(ServerError::Socket)?;
        socket
            .bind(addr)
            .map_err(|source| ServerError::BindFailed { addr, source })?;
        let listener = socket
            .listen(config.listen_backlog)
            .map_err(|source| ServerError::ListenFailed { addr, source })?;

        let (tx, rx) = mpsc::channel(256);
        let server = Self {
            listener,
            connections: ConnectionSet::new(config.max_connections),
            recv_buffer_len: config.recv_buffer_len,
            event_tx: tx,
        };
        Ok((server, rx))
    }

    /// The address the listener is bound to (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Number of currently registered connections.
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }

    /// Runs the multiplex loop until `shutdown` fires, then broadcasts the
    /// shutdown notice, closes every connection and the listener, and
    /// returns.
    ///
    /// Each cycle blocks on one combined wait.  Priority within a cycle is
    /// shutdown, then acceptance, then reads, so a pending connection is
    /// always registered before existing peers are drained, and the shutdown
    /// coordinator only ever runs between dispatch passes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServerError> {
        loop {
            let wakeup = tokio::select! {
                biased;
                _ = shutdown.changed() => Wakeup::Shutdown,
                incoming = self.listener.accept() => Wakeup::Incoming(incoming),
                _ = self.connections.readable() => Wakeup::Readable,
            };

            match wakeup {
                Wakeup::Shutdown => break,
                Wakeup::Incoming(Ok((stream, peer_addr))) => self.accept_peer(stream, peer_addr),
                Wakeup::Incoming(Err(e)) => {
                    // Transient resource exhaustion must not take the server
                    // down or disturb the registered connections.
                    warn!("accept failed: {e}");
                }
                Wakeup::Readable => self.dispatch_reads(),
            }
        }

        self.broadcast_shutdown();
        Ok(())
    }

    /// Registers one accepted connection, or refuses it at capacity.
    fn accept_peer(&mut self, stream: TcpStream, peer_addr: SocketAddr) {
        if self.connections.is_full() {
            let active = self.connections.len();
            debug!("refusing {peer_addr}: {active} connections active (ceiling reached)");
            self.emit(ServerEvent::ConnectionRefused { peer_addr, active });
            // Dropping the stream closes the refused socket.
            return;
        }

        let id = self.connections.register(stream, peer_addr);
        debug!("accepted {peer_addr} as {id}");
        self.emit(ServerEvent::PeerConnected { id, peer_addr });
    }

    /// One dispatch pass: a bounded non-blocking read attempt on every
    /// member, in ascending identifier order.
    ///
    /// The pass works from an identifier snapshot and re-checks membership
    /// per handle, so a connection removed earlier in the same pass is
    /// skipped rather than read through.  A member that is not actually
    /// ready reports `WouldBlock` and is left alone.
    fn dispatch_reads(&mut self) {
        let mut buf = vec![0u8; self.recv_buffer_len];

        for id in self.connections.ids() {
            let (outcome, peer_addr) = match self.connections.get(id) {
                Some(conn) => (conn.stream.try_read(&mut buf), conn.peer_addr),
                None => continue,
            };

            match outcome {
                Ok(0) => self.close_peer(id, peer_addr, DisconnectReason::PeerClosed),
                Ok(n) => {
                    debug!("read {n} byte(s) from {id} ({peer_addr})");
                    self.emit(ServerEvent::MessageReceived {
                        id,
                        peer_addr,
                        payload: buf[..n].to_vec(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => self.close_peer(id, peer_addr, DisconnectReason::ReadFailed(e)),
            }
        }
    }

    /// Removes one connection from the set and releases its socket.
    ///
    /// Errors on a single connection end that connection's life only; they
    /// never reach the loop or the other members.
    fn close_peer(&mut self, id: ConnectionId, peer_addr: SocketAddr, reason: DisconnectReason) {
        if self.connections.remove(id).is_some() {
            debug!("removed {id} ({peer_addr}): {reason:?}");
            self.emit(ServerEvent::PeerDisconnected {
                id,
                peer_addr,
                reason,
            });
        }
    }

    /// Sends the fixed notice to every live connection exactly once, closes
    /// each, and reports the count.
    ///
    /// A notice send failure is ignored: the connection is being torn down
    /// regardless.  The listener itself closes when the server drops after
    /// [`RelayServer::run`] returns.
    fn broadcast_shutdown(&mut self) {
        let departing = self.connections.drain();
        let notified = departing.len();
        info!("shutting down; notifying {notified} connection(s)");

        for conn in departing {
            if let Err(e) = conn.stream.try_write(SHUTDOWN_NOTICE) {
                debug!("shutdown notice to {} not delivered: {e}", conn.peer_addr);
            }
            // Dropping the connection closes its socket.
        }

        self.emit(ServerEvent::ShutdownBroadcast { notified });
    }

    /// Forwards an event to the application layer without ever blocking the
    /// loop.  A full or closed channel drops the event.
    fn emit(&self, event: ServerEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("server event dropped: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
