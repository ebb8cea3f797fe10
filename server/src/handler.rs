//! Per-connection loop: repeated dialogue rounds plus the "another?" prompt

use crate::catalog::JokeCatalog;
use crate::connection::Connection;
use crate::dialogue::{self, DialogueOutcome};
use crate::error::SessionError;
use crate::session::SessionState;
use log::debug;
use shared::{another_prompt, is_no, is_yes, NO_MORE_JOKES, PLEASE_REPLY_YN};
use tokio::io::{AsyncRead, AsyncWrite};

/// Why a session ended without an I/O failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client answered "no" to another joke
    Declined { jokes_told: usize },
    /// Every joke in the catalog has been used up
    Exhausted { jokes_told: usize },
}

/// Drives a client through as many jokes as it wants.
pub async fn run<S>(
    conn: &mut Connection<S>,
    catalog: &JokeCatalog,
    session: &mut SessionState,
) -> Result<SessionEnd, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut jokes_told = 0;

    loop {
        match dialogue::tell_joke(conn, catalog, session).await? {
            DialogueOutcome::Told(_) => jokes_told += 1,
            DialogueOutcome::Exhausted => {
                conn.write_line(NO_MORE_JOKES).await?;
                return Ok(SessionEnd::Exhausted { jokes_told });
            }
        }

        if !wants_another(conn, session).await? {
            return Ok(SessionEnd::Declined { jokes_told });
        }
    }
}

/// Asks the Y/N question until a recognisable answer arrives
async fn wants_another<S>(
    conn: &mut Connection<S>,
    session: &SessionState,
) -> Result<bool, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        conn.write_line(&another_prompt()).await?;
        let reply = conn.read_reply().await?;

        if is_yes(&reply) {
            return Ok(true);
        }
        if is_no(&reply) {
            return Ok(false);
        }

        debug!("Client {}: unrecognised answer {:?}", session.id, reply);
        conn.write_line(PLEASE_REPLY_YN).await?;
    }
}
