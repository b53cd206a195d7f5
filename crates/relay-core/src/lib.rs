//! # relay-core
//!
//! Shared library for the TCP relay containing the wire-level constants and
//! the shutdown-notice matcher.
//!
//! This crate is used by both the server and client applications.
//! It has zero dependencies on OS APIs or network sockets.
//!
//! The relay has no message framing: peers exchange opaque byte payloads and
//! each read yields whatever is currently available.  The only piece of wire
//! contract both sides must agree on is the shutdown notice the server
//! broadcasts when it is stopped, which the client recognises by substring
//! match.  That notice, the default port, and the per-read buffer bound all
//! live here so the two binaries cannot drift apart.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `relay_core::SHUTDOWN_NOTICE` instead of `relay_core::protocol::SHUTDOWN_NOTICE`.
pub use protocol::{
    contains_shutdown_notice, DEFAULT_PORT, RECV_BUFFER_LEN, SHUTDOWN_NOTICE,
    SHUTDOWN_NOTICE_TEXT,
};
