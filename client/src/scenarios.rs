//! Scripted end-to-end checks against a running server
//!
//! Every scenario opens its own connection, plays the protocol the way a
//! well-behaved (or deliberately wrong) client would, and reports the first
//! deviation it sees. Reads are bounded by [`READ_TIMEOUT`] so a stuck
//! server fails the scenario instead of hanging it.

use crate::network::ServerLink;
use log::debug;
use shared::{
    setup_reply, LineError, ServerLine, CORRECTION_PREFIX, KNOCK_KNOCK, WHO_IS_THERE,
};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

pub const READ_TIMEOUT: Duration = Duration::from_secs(7);

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Line(#[from] LineError),

    #[error("no line from server within {0:?}")]
    Timeout(Duration),

    #[error("server closed the connection early")]
    Closed,

    #[error("expected {expected}, got {got:?}")]
    Unexpected { expected: String, got: String },

    #[error("server still accepts connections after the idle timeout")]
    StillAccepting,

    #[error("client {id}: {source}")]
    Client {
        id: usize,
        #[source]
        source: Box<ScenarioError>,
    },
}

/// One scripted connection
struct Probe {
    link: ServerLink,
    read_timeout: Duration,
}

impl Probe {
    async fn connect(addr: SocketAddr) -> Result<Self, ScenarioError> {
        let link = ServerLink::connect(addr)
            .await
            .map_err(ScenarioError::Connect)?;
        Ok(Self {
            link,
            read_timeout: READ_TIMEOUT,
        })
    }

    async fn next(&mut self) -> Result<Option<ServerLine>, ScenarioError> {
        match timeout(self.read_timeout, self.link.recv_line()).await {
            Ok(line) => Ok(line?),
            Err(_) => Err(ScenarioError::Timeout(self.read_timeout)),
        }
    }

    async fn line(&mut self) -> Result<ServerLine, ScenarioError> {
        self.next().await?.ok_or(ScenarioError::Closed)
    }

    /// Skips informational lines up to the next one that wants a reply
    async fn prompt(&mut self) -> Result<ServerLine, ScenarioError> {
        loop {
            let line = self.line().await?;
            if line.expects_input {
                return Ok(line);
            }
        }
    }

    async fn send(&mut self, line: &str) -> Result<(), ScenarioError> {
        self.link.send_line(line).await?;
        Ok(())
    }

    async fn expect_knock(&mut self) -> Result<(), ScenarioError> {
        let line = self.prompt().await?;
        expect(&line, KNOCK_KNOCK, |l| l.text.contains(KNOCK_KNOCK))
    }

    /// Knock prompt with no other line in between
    async fn expect_immediate_knock(&mut self) -> Result<(), ScenarioError> {
        let line = self.line().await?;
        expect(&line, "a fresh knock prompt", |l| {
            l.expects_input && l.text.contains(KNOCK_KNOCK)
        })
    }

    async fn expect_correction(&mut self) -> Result<(), ScenarioError> {
        let line = self.line().await?;
        expect(&line, "a correction", |l| {
            !l.expects_input && l.text.starts_with(CORRECTION_PREFIX)
        })
    }

    /// Answers the setup correctly, reads the punchline and declines another
    async fn finish_joke(&mut self) -> Result<(), ScenarioError> {
        self.send(WHO_IS_THERE).await?;
        let setup = self.prompt().await?.text;
        self.send(&setup_reply(&setup)).await?;

        let punchline = self.line().await?;
        expect(&punchline, "a punchline", |l| !l.expects_input)?;

        let another = self.prompt().await?;
        expect(&another, "the Y/N prompt", |l| l.text.contains("(Y/N)"))?;
        self.send("N").await?;
        self.expect_closed().await
    }

    async fn expect_closed(&mut self) -> Result<(), ScenarioError> {
        match self.next().await? {
            None => Ok(()),
            Some(line) => Err(ScenarioError::Unexpected {
                expected: "connection close".to_string(),
                got: line.text,
            }),
        }
    }
}

fn expect(
    line: &ServerLine,
    expected: &str,
    check: impl Fn(&ServerLine) -> bool,
) -> Result<(), ScenarioError> {
    if check(line) {
        debug!("ok: {}", expected);
        Ok(())
    } else {
        Err(ScenarioError::Unexpected {
            expected: expected.to_string(),
            got: line.text.clone(),
        })
    }
}

/// Complete one joke correctly, then answer N
pub async fn happy_path(addr: SocketAddr) -> Result<(), ScenarioError> {
    let mut probe = Probe::connect(addr).await?;
    probe.expect_knock().await?;
    probe.finish_joke().await
}

/// "Who there?" gets a correction and an immediate new knock
pub async fn wrong_first_reply(addr: SocketAddr) -> Result<(), ScenarioError> {
    let mut probe = Probe::connect(addr).await?;
    probe.expect_knock().await?;

    probe.send("Who there?").await?;
    probe.expect_correction().await?;
    probe.expect_immediate_knock().await?;

    probe.finish_joke().await
}

/// "<setup> whoo?" gets a correction and restarts from the knock
pub async fn wrong_second_reply(addr: SocketAddr) -> Result<(), ScenarioError> {
    let mut probe = Probe::connect(addr).await?;
    probe.expect_knock().await?;

    probe.send(WHO_IS_THERE).await?;
    let setup = probe.prompt().await?.text;
    probe.send(&format!("{} whoo?", setup)).await?;
    probe.expect_correction().await?;
    probe.expect_immediate_knock().await?;

    probe.finish_joke().await
}

/// `clients` happy-path sessions running at the same time
pub async fn concurrent(addr: SocketAddr, clients: usize) -> Result<(), ScenarioError> {
    let handles: Vec<_> = (0..clients)
        .map(|_| tokio::spawn(happy_path(addr)))
        .collect();

    let mut first_error = None;
    for (id, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ScenarioError::Io(io::Error::new(io::ErrorKind::Other, e))),
        };

        if let Err(e) = result {
            debug!("client {} failed: {}", id, e);
            first_error.get_or_insert(ScenarioError::Client {
                id,
                source: Box::new(e),
            });
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Waits `wait`, then expects the server to refuse new connections
pub async fn idle_shutdown(addr: SocketAddr, wait: Duration) -> Result<(), ScenarioError> {
    sleep(wait).await;
    match TcpStream::connect(addr).await {
        Ok(_) => Err(ScenarioError::StillAccepting),
        Err(_) => Ok(()),
    }
}
