//! Line-oriented framing over a client socket

use crate::error::SessionError;
use shared::MAX_LINE_LEN;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Buffered, newline-framed text stream
///
/// Generic over the underlying stream so the protocol can be driven by an
/// in-memory pipe in tests; the server uses it with a `TcpStream`.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    stream: BufReader<S>,
    max_line_len: usize,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(socket: S) -> Self {
        Self {
            stream: BufReader::new(socket),
            max_line_len: MAX_LINE_LEN,
        }
    }

    /// Sends `line` followed by a newline and flushes immediately
    pub async fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        let mut out = String::with_capacity(line.len() + 1);
        out.push_str(line);
        out.push('\n');

        self.stream.write_all(out.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Waits for the client's next line.
    ///
    /// End of stream is reported as [`SessionError::Disconnected`], since the
    /// protocol only reads when a reply is owed.
    pub async fn read_reply(&mut self) -> Result<String, SessionError> {
        match shared::read_line(&mut self.stream, self.max_line_len).await? {
            Some(line) => Ok(line),
            None => Err(SessionError::Disconnected),
        }
    }
}
