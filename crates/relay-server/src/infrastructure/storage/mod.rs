//! File-system storage for the relay server.

pub mod config;
