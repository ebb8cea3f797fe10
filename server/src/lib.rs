//! # Knock-Knock Joke Server Library
//!
//! A multi-client TCP server that plays the knock-knock routine with every
//! connected client, drawing jokes from a catalog loaded once at startup.
//!
//! ## Core Responsibilities
//!
//! ### Protocol State Machine
//! Each connection runs its own dialogue: "Knock knock!", the client's
//! "Who's there?", the setup, the client's "<setup> who?" and finally the
//! punchline. Replies are matched case-insensitively after trimming, with no
//! tolerance for spelling changes. Wrong answers get a correction line and
//! another chance.
//!
//! ### Client Management
//! Every accepted socket is served by an independent task. The only state
//! shared between tasks is the active-session counter, which the accept loop
//! reads on each tick to drive the idle shutdown.
//!
//! ### Idle and Signal Shutdown
//! When no client has been connected for the idle threshold (10 seconds by
//! default) the server stops accepting. Ctrl-C and SIGTERM do the same. In
//! both cases running sessions are allowed to finish before the process
//! exits.
//!
//! ## Module Organization
//!
//! ### Catalog Module (`catalog`)
//! Joke records, the shared read-only catalog, and the SQLite loader.
//!
//! ### Session Module (`session`)
//! Per-client told-joke tracking and private random selection.
//!
//! ### Connection Module (`connection`)
//! Newline-framed reads and writes with a maximum line length.
//!
//! ### Dialogue Module (`dialogue`)
//! The knock-knock state machine for one joke, including the
//! correction-and-retry and correction-and-restart paths.
//!
//! ### Handler Module (`handler`)
//! Repeats dialogues and asks whether the client wants another.
//!
//! ### Client Manager Module (`client_manager`)
//! Atomic active-session counter, session guards and the idle timer.
//!
//! ### Network Module (`network`)
//! The accept loop, task spawning and shutdown handling.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::catalog::{JokeCatalog, SqliteSource};
//! use server::network::{shutdown_signal, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = JokeCatalog::load(&SqliteSource::new("jokes.db"))?;
//!     let server = Server::bind(ServerConfig::default(), catalog).await?;
//!
//!     // Returns after an idle timeout or Ctrl-C, once all clients are done
//!     server.run(shutdown_signal()).await;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client_manager;
pub mod connection;
pub mod dialogue;
pub mod error;
pub mod handler;
pub mod network;
pub mod session;

pub use error::{CatalogError, SessionError};
