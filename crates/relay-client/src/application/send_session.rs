//! SendSession: one relay round per operator line.
//!
//! Each round is a fixed two-phase operation: send the line (blocking,
//! bounded), then make a single non-blocking check for the server's shutdown
//! notice.  The round's outcome tells the interactive loop whether to keep
//! prompting or stop.

use tracing::debug;

use crate::infrastructure::network::{ClientError, NoticePoll, ServerLink};

/// Outcome of one send-then-poll round.
#[derive(Debug)]
pub enum SessionStep {
    /// The line was delivered; keep prompting.
    Sent,
    /// The server announced shutdown; stop.
    NoticeReceived(String),
    /// The server closed the connection; stop.
    ServerClosed,
    /// The send itself failed; stop.
    SendFailed(ClientError),
}

/// Drives the client's send loop over one [`ServerLink`].
pub struct SendSession {
    link: ServerLink,
}

impl SendSession {
    pub fn new(link: ServerLink) -> Self {
        Self { link }
    }

    /// Sends one line and then checks once for the shutdown notice.
    ///
    /// Inbound bytes that do not contain the notice are ignored and the
    /// session keeps running.  A notice sent by the server between this
    /// round's check and the next send is observed late, when that send
    /// fails; see [`ServerLink::poll_notice`].
    pub async fn submit_line(&mut self, line: &str) -> SessionStep {
        if let Err(e) = self.link.send(line.as_bytes()).await {
            return SessionStep::SendFailed(e);
        }

        match self.link.poll_notice() {
            NoticePoll::Notice(text) => SessionStep::NoticeReceived(text),
            NoticePoll::Closed => SessionStep::ServerClosed,
            NoticePoll::Data(bytes) => {
                debug!("ignoring {} non-notice byte(s) from server", bytes.len());
                SessionStep::Sent
            }
            NoticePoll::Pending => SessionStep::Sent,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
