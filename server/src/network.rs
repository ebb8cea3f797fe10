//! Server network layer: accept loop, session spawning and idle shutdown

use crate::catalog::JokeCatalog;
use crate::client_manager::{ClientManager, IdleTimer};
use crate::connection::Connection;
use crate::error::SessionError;
use crate::handler::{self, SessionEnd};
use crate::session::SessionState;
use log::{debug, error, info, warn};
use shared::{DEFAULT_BACKLOG, DEFAULT_PORT, IDLE_TIMEOUT, TICK_INTERVAL};
use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Listening and shutdown parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Pending-accept queue length passed to `listen`
    pub backlog: u32,
    /// How often the accept loop re-evaluates the idle condition
    pub tick: Duration,
    /// How long the server may sit with zero clients before exiting
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            backlog: DEFAULT_BACKLOG,
            tick: TICK_INTERVAL,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}

/// Why the accept loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// No clients for the whole idle threshold
    Idle,
    /// Operator requested shutdown
    Signal,
}

/// Accepts clients and runs one session task per connection
pub struct Server {
    listener: TcpListener,
    catalog: JokeCatalog,
    clients: Arc<ClientManager>,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig, catalog: JokeCatalog) -> io::Result<Self> {
        let socket = if config.addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(config.addr)?;
        let listener = socket.listen(config.backlog)?;

        info!(
            "Server listening on {} with {} jokes",
            listener.local_addr()?,
            catalog.len()
        );

        Ok(Server {
            listener,
            catalog,
            clients: Arc::new(ClientManager::new()),
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle on the shared active-session counter
    pub fn clients(&self) -> Arc<ClientManager> {
        Arc::clone(&self.clients)
    }

    /// Main accept loop
    ///
    /// Runs until `shutdown` resolves or the server has had no clients for
    /// the configured idle timeout. The listener is closed as soon as the
    /// loop exits; sessions already running are left to finish on their own
    /// and this method returns once they have.
    pub async fn run(self, shutdown: impl Future) -> ShutdownReason {
        let Server {
            listener,
            catalog,
            clients,
            config,
        } = self;

        let mut idle = IdleTimer::new(config.idle_timeout);
        let mut tick_interval = interval(config.tick);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        tick_interval.tick().await;

        tokio::pin!(shutdown);

        let reason = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received. Waiting for clients to finish...");
                    break ShutdownReason::Signal;
                }

                accepted = listener.accept() => match accepted {
                    Ok((socket, addr)) => {
                        idle.reset();
                        Self::spawn_session(&clients, &catalog, socket, addr);
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },

                _ = tick_interval.tick() => {
                    let active = clients.active();
                    let was_running = idle.is_running();

                    if idle.observe(active, Instant::now().into_std()) {
                        info!(
                            "No active clients for {:?}. Shutting down server.",
                            idle.threshold()
                        );
                        break ShutdownReason::Idle;
                    }

                    if idle.is_running() && !was_running {
                        info!(
                            "Server will shut down in {:?} if no client connects",
                            idle.threshold()
                        );
                    }
                },
            }
        };

        drop(listener);

        if !clients.is_empty() {
            info!("Waiting for {} active clients", clients.active());
        }
        clients.wait_until_idle().await;
        info!("Server shut down successfully");

        reason
    }

    fn spawn_session(
        clients: &Arc<ClientManager>,
        catalog: &JokeCatalog,
        socket: TcpStream,
        addr: SocketAddr,
    ) {
        let guard = clients.register(addr);
        let catalog = catalog.clone();

        tokio::spawn(async move {
            let mut session = SessionState::new(guard.id(), guard.addr());
            let mut connection = Connection::new(socket);

            match handler::run(&mut connection, &catalog, &mut session).await {
                Ok(SessionEnd::Declined { jokes_told }) => {
                    debug!("Client {} declined after {} jokes", session.id, jokes_told);
                }
                Ok(SessionEnd::Exhausted { jokes_told }) => {
                    info!("Client {} ran out of jokes after {} told", session.id, jokes_told);
                }
                Err(SessionError::Disconnected) => {
                    debug!("Client {} hung up mid-session", session.id);
                }
                Err(e) => {
                    warn!("Client {} session aborted: {}", session.id, e);
                }
            }

            // Close the socket before the guard releases the active slot
            drop(connection);
            drop(guard);
        });
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
