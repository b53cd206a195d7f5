//! Infrastructure layer for the relay server.
//!
//! Contains the OS-facing adapters: the TCP listener with its multiplex loop,
//! and TOML configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
