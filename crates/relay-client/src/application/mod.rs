//! Application layer for the relay client.
//!
//! Contains the send-loop logic, decoupled from the console so it can be
//! exercised in tests against a real server.

pub mod send_session;
