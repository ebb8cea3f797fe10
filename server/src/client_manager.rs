//! Active-session accounting and the idle-shutdown timer
//!
//! This module holds the only state shared between the accept loop and the
//! session tasks:
//! - The count of currently connected clients, updated atomically
//! - Client id assignment for log correlation
//! - A drain signal so the supervisor can wait for in-flight sessions
//!
//! The idle timer itself is owned by the accept loop alone and is a plain
//! value; it only reads the shared count.

use log::info;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Tracks how many sessions are running
///
/// Incremented by the accept loop when a socket is accepted and decremented
/// when the session's [`ClientGuard`] drops, so the count stays exact on
/// every exit path of a session task, including panics.
#[derive(Debug)]
pub struct ClientManager {
    /// Sessions currently connected
    active: AtomicUsize,
    /// Next id handed to a new connection
    next_client_id: AtomicU32,
    /// Woken whenever a session ends
    released: Notify,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            next_client_id: AtomicU32::new(1),
            released: Notify::new(),
        }
    }

    /// Records a newly accepted connection
    ///
    /// The returned guard must be moved into the task serving the client;
    /// dropping it marks the session finished.
    pub fn register(self: &Arc<Self>, addr: SocketAddr) -> ClientGuard {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Client {} connected from {} ({} active)",
            id, addr, active
        );

        ClientGuard {
            id,
            addr,
            manager: Arc::clone(self),
        }
    }

    fn release(&self, id: u32) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        info!("Client {} disconnected. Active clients: {}", id, remaining);
        self.released.notify_waiters();
    }

    /// Returns the number of currently connected clients
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.active() == 0
    }

    /// Resolves once every registered session has ended
    pub async fn wait_until_idle(&self) {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            // Register interest before checking so a release in between is not lost
            released.as_mut().enable();

            if self.is_empty() {
                return;
            }
            released.await;
        }
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of one running session; decrements the active count on drop
#[derive(Debug)]
pub struct ClientGuard {
    id: u32,
    addr: SocketAddr,
    manager: Arc<ClientManager>,
}

impl ClientGuard {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.manager.release(self.id);
    }
}

/// Measures how long the server has continuously had zero clients
///
/// The timer starts on the first observation of an empty server and is
/// cleared by any observation with clients, or by an explicit [`reset`]
/// when a connection is accepted. A later idle period starts from zero.
///
/// [`reset`]: IdleTimer::reset
#[derive(Debug, Clone)]
pub struct IdleTimer {
    threshold: Duration,
    zero_since: Option<Instant>,
}

impl IdleTimer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            zero_since: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_running(&self) -> bool {
        self.zero_since.is_some()
    }

    pub fn reset(&mut self) {
        self.zero_since = None;
    }

    /// Feeds one tick's view of the active count
    ///
    /// Returns true when the server has been empty for at least the
    /// threshold and should stop accepting connections.
    pub fn observe(&mut self, active: usize, now: Instant) -> bool {
        if active > 0 {
            self.reset();
            return false;
        }

        match self.zero_since {
            None => {
                self.zero_since = Some(now);
                false
            }
            Some(since) => now.saturating_duration_since(since) >= self.threshold,
        }
    }
}
