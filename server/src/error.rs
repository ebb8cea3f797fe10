//! Error types for catalog loading and per-connection sessions

use shared::LineError;
use std::path::PathBuf;
use thiserror::Error;

/// Startup failures; any of these aborts the process
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot open joke database {path:?}: {source}")]
    Unreachable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("joke database is malformed: {0}")]
    Malformed(#[from] rusqlite::Error),

    #[error("no jokes found in the catalog")]
    Empty,
}

/// Failures that end a single client session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("client closed the connection")]
    Disconnected,

    #[error(transparent)]
    Line(#[from] LineError),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Line(LineError::Io(err))
    }
}
