//! The knock-knock exchange for a single joke
//!
//! One call to [`tell_joke`] drives the exchange to completion:
//!
//! ```text
//! Select ──► AwaitKnockAck ──► AwaitSetupAck ──► Punchline ──► Done
//!   ▲             │  ▲               │
//!   │             └──┘ wrong reply   │
//!   └────────────────────────────────┘ wrong reply
//! ```
//!
//! A wrong answer to "Knock knock!" repeats the knock for the same joke. A
//! wrong answer to the setup abandons the current joke and starts over with a
//! fresh selection; the abandoned joke stays marked as told. Neither path has
//! a retry cap. Restarts re-enter the loop rather than recursing.

use crate::catalog::JokeCatalog;
use crate::connection::Connection;
use crate::error::SessionError;
use crate::session::SessionState;
use log::debug;
use shared::{correction, knock_prompt, prompt, replies_match, setup_reply, WHO_IS_THERE};
use tokio::io::{AsyncRead, AsyncWrite};

/// How a dialogue round ended, short of a connection failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueOutcome {
    /// The punchline for this catalog index was delivered
    Told(usize),
    /// Every joke in the catalog has already been offered to this client
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Select,
    AwaitKnockAck(usize),
    AwaitSetupAck(usize),
    Punchline(usize),
}

/// Runs one complete knock-knock exchange over `conn`.
///
/// Any read or write failure aborts immediately with the underlying
/// [`SessionError`]; running out of jokes is reported as
/// [`DialogueOutcome::Exhausted`] without writing anything.
pub async fn tell_joke<S>(
    conn: &mut Connection<S>,
    catalog: &JokeCatalog,
    session: &mut SessionState,
) -> Result<DialogueOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stage = Stage::Select;

    loop {
        stage = match stage {
            Stage::Select => match session.pick_untold(catalog.len()) {
                Some(index) => {
                    debug!("Client {}: selected joke {}", session.id, index);
                    Stage::AwaitKnockAck(index)
                }
                None => return Ok(DialogueOutcome::Exhausted),
            },

            Stage::AwaitKnockAck(index) => {
                conn.write_line(&knock_prompt()).await?;
                let reply = conn.read_reply().await?;

                if replies_match(&reply, WHO_IS_THERE) {
                    Stage::AwaitSetupAck(index)
                } else {
                    debug!("Client {}: wrong knock reply {:?}", session.id, reply);
                    conn.write_line(&correction(WHO_IS_THERE)).await?;
                    Stage::AwaitKnockAck(index)
                }
            }

            Stage::AwaitSetupAck(index) => {
                let joke = &catalog[index];
                conn.write_line(&prompt(&joke.setup)).await?;
                let reply = conn.read_reply().await?;

                let expected = setup_reply(&joke.setup);
                if replies_match(&reply, &expected) {
                    Stage::Punchline(index)
                } else {
                    debug!(
                        "Client {}: wrong setup reply {:?}, restarting",
                        session.id, reply
                    );
                    conn.write_line(&correction(&expected)).await?;
                    Stage::Select
                }
            }

            Stage::Punchline(index) => {
                conn.write_line(&catalog[index].punchline).await?;
                return Ok(DialogueOutcome::Told(index));
            }
        };
    }
}
