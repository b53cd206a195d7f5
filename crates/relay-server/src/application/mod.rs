//! Application layer for the relay server.
//!
//! Contains logic with no socket, file-system, or OS imports: the console
//! observation of relay traffic.
//!
//! **Dependency rule**: the infrastructure layer may depend on this module,
//! but this module never imports infrastructure types.  The binary's event
//! pump translates network events into plain-data calls on [`observe_messages`].

pub mod observe_messages;
