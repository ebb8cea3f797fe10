use clap::Parser;
use log::{error, info};
use server::catalog::{sample_jokes, JokeCatalog, SqliteSource};
use server::network::{shutdown_signal, Server, ServerConfig, ShutdownReason};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
    /// SQLite database holding the `jokes` table
    #[clap(short, long, default_value = "jokes.db")]
    database: PathBuf,
    /// Pending connection queue length
    #[clap(long, default_value_t = shared::DEFAULT_BACKLOG)]
    backlog: u32,
    /// Seconds without clients before the server exits
    #[clap(long, default_value = "10")]
    idle_timeout: u64,
    /// Idle check interval in milliseconds
    #[clap(long, default_value = "1000")]
    tick_ms: u64,
    /// Create the table and insert sample jokes if the database is empty
    #[clap(long)]
    seed: bool,
}

/// Loads the catalog, binds, and serves until idle or interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let source = SqliteSource::new(&args.database);

    if args.seed {
        source.seed(&sample_jokes())?;
    }

    let catalog = match JokeCatalog::load(&source) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Cannot start: {}", e);
            return Err(e.into());
        }
    };

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let config = ServerConfig {
        addr,
        backlog: args.backlog,
        tick: Duration::from_millis(args.tick_ms.max(1)),
        idle_timeout: Duration::from_secs(args.idle_timeout),
    };

    let server = match Server::bind(config, catalog).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to listen on {}: {}", addr, e);
            return Err(e.into());
        }
    };
    info!("Press Ctrl+C to stop the server gracefully.");

    match server.run(shutdown_signal()).await {
        ShutdownReason::Idle => info!("Exiting after idle timeout"),
        ShutdownReason::Signal => info!("Exiting on operator request"),
    }

    Ok(())
}
