use clap::Parser;
use client::interactive::{self, Ended};
use client::network::ServerLink;
use log::info;
use tokio::io::{stdin, stdout, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IPv4 address or host name
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(default_value_t = shared::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Connecting to {}:{}", args.host, args.port);
    let mut link = ServerLink::connect((args.host.as_str(), args.port)).await?;
    println!(
        "Connected to {}:{}. Type your responses when prompted.",
        args.host, args.port
    );

    let mut input = BufReader::new(stdin());
    let mut output = stdout();

    match interactive::run(&mut link, &mut input, &mut output).await? {
        Ended::ServerClosed => println!("Connection closed by server."),
        Ended::InputClosed => info!("Input closed, leaving"),
        Ended::NoMoreJokes => {}
    }

    Ok(())
}
