use crate::game::ClientGameState;
use crate::input::{Command, HELP};
use crate::mode::{LocalGame, Mode, Route};
use crate::rendering::Renderer;
use log::{debug, error, info, warn};
use shared::{read_packet, write_packet, Packet, PROTOCOL_VERSION};
use std::io::Stdout;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub type ClientResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("server refused the connection: {0}")]
    Refused(String),
    #[error("server closed the connection during the handshake")]
    Closed,
    #[error("expected Connected, got {0:?}")]
    Unexpected(Packet),
}

/// Open server connection: our half for writing plus a queue fed by the
/// reader task
struct Connection {
    writer: OwnedWriteHalf,
    incoming: mpsc::UnboundedReceiver<Packet>,
}

impl Connection {
    async fn open(server_addr: &str) -> ClientResult<(Self, u32)> {
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        let (mut reader, mut writer) = stream.into_split();

        write_packet(
            &mut writer,
            &Packet::Connect {
                client_version: PROTOCOL_VERSION,
            },
        )
        .await?;

        let client_id = match read_packet(&mut reader).await? {
            Some(Packet::Connected { client_id }) => client_id,
            Some(Packet::Disconnected { reason }) => return Err(HandshakeError::Refused(reason).into()),
            Some(other) => return Err(HandshakeError::Unexpected(other).into()),
            None => return Err(HandshakeError::Closed.into()),
        };

        let (tx, incoming) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match read_packet(&mut reader).await {
                    Ok(Some(packet)) => {
                        if tx.send(packet).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        break;
                    }
                }
            }
        });

        Ok((Connection { writer, incoming }, client_id))
    }

    async fn send(&mut self, packet: &Packet) -> ClientResult<()> {
        write_packet(&mut self.writer, packet).await?;
        Ok(())
    }
}

/// Waits for the next server packet, or forever when playing offline.
async fn next_packet(connection: &mut Option<Connection>) -> Option<Packet> {
    match connection {
        Some(connection) => connection.incoming.recv().await,
        None => std::future::pending().await,
    }
}

/// Terminal client: reads commands from stdin and shows notifications
pub struct Client {
    mode: Mode,
    connection: Option<Connection>,
    game_state: ClientGameState,
    renderer: Renderer<Stdout>,
}

impl Client {
    /// Offline game against the AI.
    pub fn local() -> Self {
        Client {
            mode: Mode::Local(LocalGame::new()),
            connection: None,
            game_state: ClientGameState::local(),
            renderer: Renderer::new(std::io::stdout()),
        }
    }

    /// Connects and completes the handshake with the server at `server_addr`.
    pub async fn connect(server_addr: &str) -> ClientResult<Self> {
        info!("Connecting to server at {}...", server_addr);
        let (connection, client_id) = Connection::open(server_addr).await?;
        info!("Connected! Client ID: {}", client_id);

        let mut game_state = ClientGameState::new();
        game_state.apply(&Packet::Connected { client_id });

        Ok(Client {
            mode: Mode::Networked,
            connection: Some(connection),
            game_state,
            renderer: Renderer::new(std::io::stdout()),
        })
    }

    fn show(&mut self, packet: &Packet) -> ClientResult<()> {
        self.game_state.apply(packet);
        self.renderer.notification(packet, &self.game_state)?;
        Ok(())
    }

    /// Runs one command. Returns false when the player asked to quit.
    async fn handle_line(&mut self, line: &str) -> ClientResult<bool> {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                self.renderer.message(&e.to_string())?;
                return Ok(true);
            }
        };
        let leaving = command == Command::Leave;

        match self.mode.route(command, &self.game_state) {
            Ok(Route::Local(notifications)) => {
                for packet in &notifications {
                    self.show(packet)?;
                }
            }
            Ok(Route::Remote(packet)) => {
                debug!("Sending {:?}", packet);
                if let Some(connection) = self.connection.as_mut() {
                    connection.send(&packet).await?;
                }
                if leaving {
                    // No notification comes back for our own departure.
                    self.game_state.leave();
                }
            }
            Ok(Route::Help) => self.renderer.message(HELP)?,
            Ok(Route::Quit) => return Ok(false),
            Err(e) => self.renderer.message(&e.to_string())?,
        }

        Ok(true)
    }

    pub async fn run(&mut self) -> ClientResult<()> {
        match &self.mode {
            Mode::Local(game) => {
                for packet in game.start() {
                    self.game_state.apply(&packet);
                    self.renderer.notification(&packet, &self.game_state)?;
                }
            }
            Mode::Networked => self.renderer.render(&self.game_state)?,
        }
        self.renderer.message("Type `help` for the list of commands.")?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&line).await? {
                                break;
                            }
                        }
                        None => break,
                    }
                },

                packet = next_packet(&mut self.connection) => {
                    match packet {
                        Some(Packet::Disconnected { reason }) => {
                            warn!("Disconnected: {}", reason);
                            self.renderer.notification(&Packet::Disconnected { reason }, &self.game_state)?;
                            self.connection = None;
                            break;
                        }
                        Some(packet) => self.show(&packet)?,
                        None => {
                            warn!("Server closed the connection");
                            self.connection = None;
                            break;
                        }
                    }
                },
            }
        }

        if let Some(connection) = self.connection.as_mut() {
            let _ = connection.send(&Packet::Disconnect).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one connection, checks the handshake and answers with `reply`.
    async fn fake_server(reply: Packet) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let hello = read_packet(&mut stream).await.unwrap();
            assert_eq!(
                hello,
                Some(Packet::Connect {
                    client_version: PROTOCOL_VERSION
                })
            );
            write_packet(&mut stream, &reply).await.unwrap();
            write_packet(&mut stream, &Packet::Restarted).await.unwrap();
        });

        addr
    }

    #[tokio::test]
    async fn test_handshake_returns_client_id() {
        let addr = fake_server(Packet::Connected { client_id: 42 }).await;

        let (mut connection, client_id) = Connection::open(&addr).await.unwrap();

        assert_eq!(client_id, 42);
        assert_eq!(connection.incoming.recv().await, Some(Packet::Restarted));
    }

    #[tokio::test]
    async fn test_handshake_refused() {
        let addr = fake_server(Packet::Disconnected {
            reason: "Server full".to_string(),
        })
        .await;

        let err = Connection::open(&addr).await.err().unwrap();
        assert_eq!(
            err.to_string(),
            "server refused the connection: Server full"
        );
    }

    #[tokio::test]
    async fn test_handshake_unexpected_reply() {
        let addr = fake_server(Packet::GameDraw).await;

        let err = Connection::open(&addr).await.err().unwrap();
        assert!(err.to_string().starts_with("expected Connected"));
    }
}
