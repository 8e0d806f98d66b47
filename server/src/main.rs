use clap::Parser;
use log::{error, info};
use server::network::Server;

/// Tic-tac-toe relay server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
    /// Maximum number of simultaneous connections
    #[clap(short, long, default_value = "256")]
    max_clients: usize,
}

/// Parses command-line arguments, then runs the server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let mut server = Server::new(&address, args.max_clients).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped with error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
