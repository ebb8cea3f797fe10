use clap::Parser;
use client::scenarios::{self, ScenarioError};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// Automated protocol checks against a running joke server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Number of simultaneous clients in the concurrency check
    #[arg(short, long, default_value = "3")]
    clients: usize,

    /// Seconds to wait before checking that the server shut itself down
    #[arg(long, default_value = "12")]
    idle_wait: u64,

    /// Leave the server running at the end
    #[arg(long)]
    skip_idle: bool,
}

async fn check<F>(name: &str, scenario: F) -> bool
where
    F: Future<Output = Result<(), ScenarioError>>,
{
    println!("\n[TEST] {}", name);
    match scenario.await {
        Ok(()) => {
            println!("[OK] {}", name);
            true
        }
        Err(e) => {
            println!("[FAIL] {}: {}", name, e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let mut ok = true;
    ok &= check("happy path", scenarios::happy_path(addr)).await;
    ok &= check("wrong first reply", scenarios::wrong_first_reply(addr)).await;
    ok &= check("wrong second reply", scenarios::wrong_second_reply(addr)).await;
    ok &= check(
        &format!("concurrent ({} clients)", args.clients),
        scenarios::concurrent(addr, args.clients),
    )
    .await;

    if !args.skip_idle {
        let wait = Duration::from_secs(args.idle_wait);
        ok &= check("idle shutdown", scenarios::idle_shutdown(addr, wait)).await;
    }

    println!("\n========== SUMMARY ==========");
    if ok {
        println!("ALL TESTS PASSED");
        Ok(())
    } else {
        println!("SOME TESTS FAILED");
        Err("some scenarios failed".into())
    }
}
