//! Infrastructure layer for the relay client.
//!
//! Contains the OS-facing adapter: the TCP connection to the relay server.

pub mod network;
