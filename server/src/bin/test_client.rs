//! Smoke test against a running server: two connections play one game to a
//! row win, then the host leaves.

use clap::Parser;
use shared::{read_packet, write_packet, Mark, Packet, SessionCode, PROTOCOL_VERSION};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address to connect to
    #[clap(short, long, default_value = "127.0.0.1:3000")]
    server: String,
}

async fn expect_packet(stream: &mut TcpStream, who: &str) -> TestResult<Packet> {
    match timeout(Duration::from_secs(5), read_packet(stream)).await?? {
        Some(packet) => {
            println!("{} <- {:?}", who, packet);
            Ok(packet)
        }
        None => Err(format!("{}: server closed the connection", who).into()),
    }
}

async fn send(stream: &mut TcpStream, who: &str, packet: Packet) -> TestResult<()> {
    println!("{} -> {:?}", who, packet);
    write_packet(stream, &packet).await?;
    Ok(())
}

async fn connect(server: &str, who: &str) -> TestResult<TcpStream> {
    let mut stream = TcpStream::connect(server).await?;
    send(
        &mut stream,
        who,
        Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
    )
    .await?;

    match expect_packet(&mut stream, who).await? {
        Packet::Connected { client_id } => {
            println!("{} connected with client ID {}", who, client_id);
            Ok(stream)
        }
        other => Err(format!("{}: expected Connected, got {:?}", who, other).into()),
    }
}

#[tokio::main]
async fn main() -> TestResult<()> {
    let args = Args::parse();

    let mut host = connect(&args.server, "host").await?;
    let mut guest = connect(&args.server, "guest").await?;

    send(&mut host, "host", Packet::CreateSession).await?;
    let code: SessionCode = match expect_packet(&mut host, "host").await? {
        Packet::SessionCreated { code } => code,
        other => return Err(format!("expected SessionCreated, got {:?}", other).into()),
    };

    send(&mut guest, "guest", Packet::JoinSession { code: code.clone() }).await?;
    for _ in 0..2 {
        expect_packet(&mut host, "host").await?;
        expect_packet(&mut guest, "guest").await?;
    }

    // X takes the top row while O plays the middle row.
    let script = [(0, Mark::X), (3, Mark::O), (1, Mark::X), (4, Mark::O), (2, Mark::X)];
    for (cell, mark) in script {
        let (mover, who) = match mark {
            Mark::X => (&mut host, "host"),
            Mark::O => (&mut guest, "guest"),
        };
        send(
            mover,
            who,
            Packet::MakeMove {
                code: code.clone(),
                cell,
                mark,
            },
        )
        .await?;

        // MoveMade plus TurnChanged or GameWon, seen by both sides
        for _ in 0..2 {
            expect_packet(&mut host, "host").await?;
            expect_packet(&mut guest, "guest").await?;
        }
    }

    send(&mut host, "host", Packet::LeaveSession).await?;
    match expect_packet(&mut guest, "guest").await? {
        Packet::OpponentLeft => println!("Test client finished"),
        other => return Err(format!("expected OpponentLeft, got {:?}", other).into()),
    }

    send(&mut guest, "guest", Packet::Disconnect).await?;
    Ok(())
}
