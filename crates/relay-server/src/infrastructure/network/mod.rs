//! Network infrastructure for the relay server.
//!
//! # Sub-modules
//!
//! - **`connection_set`** – the authoritative collection of live accepted
//!   connections, with the combined readiness wait the multiplex loop blocks
//!   on each cycle.
//!
//! - **`relay_server`** – the listener, the multiplex loop itself, and the
//!   coordinated shutdown broadcast.

pub mod connection_set;
pub mod relay_server;
