//! Network infrastructure for the relay client.
//!
//! `ServerLink` owns the client's single TCP connection to the relay server.
//! The client's traffic pattern is strictly sequential: one bounded blocking
//! send, then one opportunistic non-blocking check for the server's shutdown
//! notice.  There is no reader task; with exactly one peer there is nothing
//! to coordinate.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use relay_core::{contains_shutdown_notice, DEFAULT_PORT, RECV_BUFFER_LEN};

/// Errors that can occur in the client network layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connection to the relay server failed.
    #[error("failed to connect to server at {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the client's connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the relay server.
    pub server_addr: SocketAddr,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
        }
    }
}

/// Result of one non-blocking check for inbound bytes.
#[derive(Debug)]
pub enum NoticePoll {
    /// The received bytes contain the shutdown notice.
    Notice(String),
    /// Bytes arrived but they are not the shutdown notice.
    Data(Vec<u8>),
    /// Nothing is waiting right now.
    Pending,
    /// The server closed the connection.
    Closed,
}

/// The client's single connection to the relay server.
pub struct ServerLink {
    stream: TcpStream,
    server_addr: SocketAddr,
}

impl ServerLink {
    /// Connects to the relay server at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectFailed`] when the server is unreachable
    /// or refuses the connection.
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::ConnectFailed { addr, source })?;
        Ok(Self {
            stream,
            server_addr: addr,
        })
    }

    /// The server address this link is connected to.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Sends one opaque payload, blocking until the whole buffer is written.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the write fails; the caller treats
    /// that as the end of the connection's life.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(payload).await?;
        Ok(())
    }

    /// One non-blocking receive attempt, classifying whatever is waiting.
    ///
    /// A notice that arrives after this check is only observed on a later
    /// call: typically when the next send fails because the server has
    /// already closed the connection.  That narrow race window is accepted
    /// behavior, not a delivery guarantee.
    pub fn poll_notice(&self) -> NoticePoll {
        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        match self.stream.try_read(&mut buf) {
            Ok(0) => NoticePoll::Closed,
            Ok(n) => {
                let received = &buf[..n];
                if contains_shutdown_notice(received) {
                    NoticePoll::Notice(
                        String::from_utf8_lossy(received).trim_end().to_string(),
                    )
                } else {
                    NoticePoll::Data(received.to_vec())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => NoticePoll::Pending,
            Err(e) => {
                debug!("receive check failed: {e}");
                NoticePoll::Closed
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::{sleep, timeout};

    /// Accept-side helper: a listener plus one established link to it.
    async fn linked_pair() -> (ServerLink, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let link = ServerLink::connect(addr).await.expect("connect");
        let (server_side, _) = listener.accept().await.expect("accept");
        (link, server_side)
    }

    /// Polls until something other than `Pending` shows up.
    async fn poll_until_settled(link: &ServerLink) -> NoticePoll {
        timeout(Duration::from_secs(5), async {
            loop {
                match link.poll_notice() {
                    NoticePoll::Pending => sleep(Duration::from_millis(10)).await,
                    settled => break settled,
                }
            }
        })
        .await
        .expect("poll never settled")
    }

    #[test]
    fn test_client_config_default_targets_loopback_on_the_shared_port() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert!(cfg.server_addr.ip().is_loopback());
        assert_eq!(cfg.server_addr.port(), DEFAULT_PORT);
    }

    #[tokio::test]
    async fn test_connect_failure_reports_the_target_address() {
        // Arrange: bind a port and release it so the connect is refused.
        let probe = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = probe.local_addr().expect("local addr");
        drop(probe);

        // Act
        let result = ServerLink::connect(addr).await;

        // Assert
        match result {
            Err(ClientError::ConnectFailed { addr: reported, .. }) => assert_eq!(reported, addr),
            other => panic!("expected ConnectFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_send_delivers_payload_verbatim() {
        use tokio::io::AsyncReadExt;

        // Arrange
        let (mut link, mut server_side) = linked_pair().await;

        // Act
        link.send(b"hello relay").await.expect("send");

        // Assert
        let mut buf = [0u8; 32];
        let n = timeout(Duration::from_secs(5), server_side.read(&mut buf))
            .await
            .expect("timed out")
            .expect("read");
        assert_eq!(&buf[..n], b"hello relay");
    }

    #[tokio::test]
    async fn test_poll_notice_is_pending_when_nothing_arrived() {
        let (link, _server_side) = linked_pair().await;
        assert!(matches!(link.poll_notice(), NoticePoll::Pending));
    }

    #[tokio::test]
    async fn test_poll_notice_recognises_the_shutdown_notice() {
        use relay_core::SHUTDOWN_NOTICE;

        // Arrange
        let (link, mut server_side) = linked_pair().await;
        server_side.write_all(SHUTDOWN_NOTICE).await.expect("write");

        // Act
        let settled = poll_until_settled(&link).await;

        // Assert
        match settled {
            NoticePoll::Notice(text) => assert!(text.contains("Server shutting down")),
            other => panic!("expected Notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_notice_passes_other_bytes_through_as_data() {
        // Arrange: arbitrary non-notice traffic must not stop the client.
        let (link, mut server_side) = linked_pair().await;
        server_side.write_all(b"just chatter").await.expect("write");

        // Act
        let settled = poll_until_settled(&link).await;

        // Assert
        match settled {
            NoticePoll::Data(bytes) => assert_eq!(bytes, b"just chatter"),
            other => panic!("expected Data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_notice_reports_a_closed_connection() {
        // Arrange
        let (link, server_side) = linked_pair().await;
        drop(server_side);

        // Act
        let settled = poll_until_settled(&link).await;

        // Assert
        assert!(matches!(settled, NoticePoll::Closed));
    }
}
