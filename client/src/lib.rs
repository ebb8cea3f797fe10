//! # Knock-Knock Client Library
//!
//! Client-side pieces for talking to the joke server. The wire protocol is
//! plain text, one message per line. A server line containing the `<input>`
//! marker is a prompt: the client owes exactly one line in reply. Every other
//! line is informational.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! [`network::ServerLink`] wraps a socket with newline framing and parses
//! each received line into display text plus an "expects input" flag.
//!
//! ### Interactive Module (`interactive`)
//! Relays server lines to a terminal and the user's typed answers back.
//! Used by the `client` binary.
//!
//! ### Scenarios Module (`scenarios`)
//! Scripted protocol checks (happy path, wrong replies, concurrent clients,
//! idle shutdown) used by the `tester` binary and the workspace integration
//! tests.

pub mod interactive;
pub mod network;
pub mod scenarios;
