use clap::Parser;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Play against the computer without a server
    #[arg(short = 'l', long)]
    local: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut client = if args.local {
        info!("Starting local game against the AI");
        Client::local()
    } else {
        Client::connect(&args.server).await?
    };

    client.run().await?;

    Ok(())
}
