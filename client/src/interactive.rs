//! Terminal session: relay server lines to the user and the user's answers back

use crate::network::ServerLink;
use shared::{LineError, MAX_LINE_LEN, NO_MORE_JOKES};
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt};

/// How the interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ended {
    ServerClosed,
    InputClosed,
    NoMoreJokes,
}

/// Runs the conversation until the server or the user stops it.
///
/// Informational lines are printed as `Server: <text>`. When a line carries
/// the input marker, the marker is hidden, `Client: ` is shown, and one line
/// read from `input` is sent back verbatim.
pub async fn run<S, I, O>(
    link: &mut ServerLink<S>,
    input: &mut I,
    output: &mut O,
) -> Result<Ended, LineError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    loop {
        let line = match link.recv_line().await? {
            Some(line) => line,
            None => return Ok(Ended::ServerClosed),
        };

        output
            .write_all(format!("Server: {}\n", line.text).as_bytes())
            .await?;

        if !line.expects_input {
            if line.text.contains(NO_MORE_JOKES) {
                output.flush().await?;
                return Ok(Ended::NoMoreJokes);
            }
            continue;
        }

        output.write_all(b"Client: ").await?;
        output.flush().await?;

        let reply = match shared::read_line(input, MAX_LINE_LEN).await? {
            Some(reply) => reply,
            None => return Ok(Ended::InputClosed),
        };
        link.send_line(&reply).await?;
    }
}
