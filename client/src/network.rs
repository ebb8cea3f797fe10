//! Line transport between a client and the joke server

use log::debug;
use shared::{LineError, ServerLine, MAX_LINE_LEN};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Buffered connection to the server, speaking newline-framed text
pub struct ServerLink<S = TcpStream> {
    stream: BufReader<S>,
}

impl ServerLink<TcpStream> {
    pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        debug!("Connected to {}", socket.peer_addr()?);
        Ok(Self::new(socket))
    }
}

impl<S> ServerLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    /// Next line from the server, or `None` once it has closed the connection
    pub async fn recv_line(&mut self) -> Result<Option<ServerLine>, LineError> {
        let raw = shared::read_line(&mut self.stream, MAX_LINE_LEN).await?;
        if let Some(raw) = &raw {
            debug!("[S] {}", raw);
        }
        Ok(raw.map(|raw| ServerLine::parse(&raw)))
    }

    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        debug!("[C] {}", line);
        let mut out = String::with_capacity(line.len() + 1);
        out.push_str(line);
        out.push('\n');

        self.stream.write_all(out.as_bytes()).await?;
        self.stream.flush().await
    }
}
