//! Wire-level constants shared by the relay server and client.
//!
//! There is deliberately no codec here: payloads travel as raw bytes with no
//! length prefix or delimiter contract, and a single read may deliver a
//! partial or several logical messages.  The shutdown notice is the one
//! exception: it is a fixed text constant sent verbatim to every connection
//! at shutdown, and the client matches it by substring, so changing it breaks
//! the other side.

// ── Wire constants ────────────────────────────────────────────────────────────

/// Default TCP port the server listens on and the client targets.
pub const DEFAULT_PORT: u16 = 8080;

/// Upper bound on a single read from a peer socket, in bytes.
///
/// A payload longer than this arrives across several reads; the relay treats
/// each read as one opaque message.
pub const RECV_BUFFER_LEN: usize = 1024;

/// Payload broadcast verbatim to every live connection at shutdown.
pub const SHUTDOWN_NOTICE: &[u8] = b"Server shutting down\n";

/// The text a client searches for in received bytes to recognise shutdown.
///
/// Kept separate from [`SHUTDOWN_NOTICE`] so the match does not depend on the
/// trailing newline surviving the peer's read boundaries.
pub const SHUTDOWN_NOTICE_TEXT: &str = "Server shutting down";

// ── Notice detection ──────────────────────────────────────────────────────────

/// Returns `true` when `payload` contains [`SHUTDOWN_NOTICE_TEXT`].
///
/// The scan is a plain byte-substring search: the payload is not assumed to
/// be valid UTF-8, and the notice may sit anywhere inside bytes that also
/// carry unrelated data from an earlier broadcast read.
pub fn contains_shutdown_notice(payload: &[u8]) -> bool {
    let needle = SHUTDOWN_NOTICE_TEXT.as_bytes();
    payload.windows(needle.len()).any(|window| window == needle)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
