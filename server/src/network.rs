//! Server network layer: TCP transport and the coordinator event loop

use crate::client_manager::ClientManager;
use crate::coordinator::{Action, Coordinator, Outbound};
use crate::registry::{ParticipantId, SessionRegistry};
use log::{debug, error, info, warn};
use shared::{read_packet, write_packet, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    NewConnection {
        stream: TcpStream,
        addr: SocketAddr,
    },
    PacketReceived {
        client_id: ParticipantId,
        packet: Packet,
    },
    ClientDisconnected {
        client_id: ParticipantId,
    },
}

/// Maps a client packet onto a coordinator action. Anything that is not a
/// session action is handed back unchanged.
pub fn to_action(packet: Packet) -> Result<Action, Packet> {
    match packet {
        Packet::CreateSession => Ok(Action::CreateSession),
        Packet::JoinSession { code } => Ok(Action::JoinSession { code }),
        Packet::MakeMove { code, cell, mark } => Ok(Action::MakeMove { code, cell, mark }),
        Packet::RestartSession { code } => Ok(Action::RestartSession { code }),
        Packet::LeaveSession => Ok(Action::Leave),
        other => Err(other),
    }
}

/// Relay server: owns the coordinator and every connection's outbound queue
///
/// All session state lives on the task running [`Server::run`]. Socket tasks
/// only decode frames and forward them, so actions are applied strictly one
/// at a time without any lock around the registry.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    coordinator: Coordinator,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, max_clients: usize) -> ServerResult<Self> {
        Self::with_coordinator(addr, max_clients, Coordinator::new(SessionRegistry::new())).await
    }

    pub async fn with_coordinator(
        addr: &str,
        max_clients: usize,
        coordinator: Coordinator,
    ) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(max_clients),
            coordinator,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns task that accepts incoming connections
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if server_tx
                            .send(ServerMessage::NewConnection { stream, addr })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that decodes frames from one connection
    fn spawn_reader(&self, client_id: ParticipantId, mut reader: OwnedReadHalf) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match read_packet(&mut reader).await {
                    Ok(Some(packet)) => {
                        if server_tx
                            .send(ServerMessage::PacketReceived { client_id, packet })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Dropping client {}: {}", client_id, e);
                        break;
                    }
                }
            }

            let _ = server_tx.send(ServerMessage::ClientDisconnected { client_id });
        });
    }

    /// Spawns task that drains one connection's outbound queue
    fn spawn_writer(
        client_id: ParticipantId,
        mut writer: OwnedWriteHalf,
        mut outbound: mpsc::UnboundedReceiver<Packet>,
    ) {
        tokio::spawn(async move {
            while let Some(packet) = outbound.recv().await {
                let closing = matches!(packet, Packet::Disconnected { .. });

                if let Err(e) = write_packet(&mut writer, &packet).await {
                    error!("Failed to send packet to client {}: {}", client_id, e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });
    }

    fn handle_new_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        let (reader, mut writer) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();

        match self.clients.add_client(addr, tx) {
            Some(client_id) => {
                self.spawn_reader(client_id, reader);
                Self::spawn_writer(client_id, writer, rx);
            }
            None => {
                warn!("Refusing connection from {}: server full", addr);
                tokio::spawn(async move {
                    let refusal = Packet::Disconnected {
                        reason: "Server full".to_string(),
                    };
                    if let Err(e) = write_packet(&mut writer, &refusal).await {
                        debug!("Could not notify {} of refusal: {}", addr, e);
                    }
                });
            }
        }
    }

    /// Processes one packet from a connected client
    fn handle_packet(&mut self, client_id: ParticipantId, packet: Packet) {
        if !self.clients.contains(client_id) {
            return;
        }

        match packet {
            Packet::Connect { client_version } => self.handle_connect(client_id, client_version),

            Packet::Disconnect => self.drop_client(client_id),

            packet => match to_action(packet) {
                Ok(action) => {
                    if !self.clients.is_handshake_complete(client_id) {
                        warn!("Client {} acted before connecting, ignoring", client_id);
                        return;
                    }
                    let outbound = self.coordinator.handle(client_id, action);
                    self.deliver(outbound);
                }
                Err(unexpected) if unexpected.is_notification() => {
                    warn!(
                        "Client {} sent a server-only packet: {:?}",
                        client_id, unexpected
                    );
                }
                Err(unexpected) => {
                    warn!(
                        "Unexpected packet from client {}: {:?}",
                        client_id, unexpected
                    );
                }
            },
        }
    }

    fn handle_connect(&mut self, client_id: ParticipantId, client_version: u32) {
        if self.clients.is_handshake_complete(client_id) {
            warn!("Client {} sent a second Connect, ignoring", client_id);
            return;
        }

        if client_version != PROTOCOL_VERSION {
            warn!(
                "Client {} speaks protocol {}, expected {}",
                client_id, client_version, PROTOCOL_VERSION
            );
            self.clients.send_to(
                client_id,
                Packet::Disconnected {
                    reason: format!("Unsupported protocol version {}", client_version),
                },
            );
            self.clients.remove_client(&client_id);
            return;
        }

        self.clients.complete_handshake(client_id);
        self.clients
            .send_to(client_id, Packet::Connected { client_id });
    }

    /// Removes a connection and closes any session it was bound to.
    fn drop_client(&mut self, client_id: ParticipantId) {
        if let Some(addr) = self.clients.addr_of(client_id) {
            debug!("Dropping client {} at {}", client_id, addr);
        }

        if self.clients.remove_client(&client_id) {
            let outbound = self.coordinator.disconnect(client_id);
            self.deliver(outbound);
        }
    }

    fn deliver(&self, outbound: Vec<Outbound>) {
        for message in outbound {
            for recipient in message.recipients() {
                self.clients.send_to(*recipient, message.packet().clone());
            }
        }
    }

    /// Main server loop: applies every network event in arrival order
    pub async fn run(&mut self) -> ServerResult<()> {
        self.spawn_acceptor();
        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::NewConnection { stream, addr } => {
                    self.handle_new_connection(stream, addr);
                }
                ServerMessage::PacketReceived { client_id, packet } => {
                    self.handle_packet(client_id, packet);
                }
                ServerMessage::ClientDisconnected { client_id } => {
                    self.drop_client(client_id);
                }
            }
        }

        info!("Server shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Mark, SessionCode};

    #[test]
    fn test_session_packets_become_actions() {
        let code = SessionCode::from_number(123456);

        assert_eq!(to_action(Packet::CreateSession), Ok(Action::CreateSession));
        assert_eq!(
            to_action(Packet::JoinSession { code: code.clone() }),
            Ok(Action::JoinSession { code: code.clone() })
        );
        assert_eq!(
            to_action(Packet::MakeMove {
                code: code.clone(),
                cell: 4,
                mark: Mark::O
            }),
            Ok(Action::MakeMove {
                code: code.clone(),
                cell: 4,
                mark: Mark::O
            })
        );
        assert_eq!(
            to_action(Packet::RestartSession { code: code.clone() }),
            Ok(Action::RestartSession { code })
        );
        assert_eq!(to_action(Packet::LeaveSession), Ok(Action::Leave));
    }

    #[test]
    fn test_other_packets_are_returned() {
        for packet in [
            Packet::Connect { client_version: 1 },
            Packet::Disconnect,
            Packet::GameDraw,
            Packet::Connected { client_id: 3 },
        ] {
            assert_eq!(to_action(packet.clone()), Err(packet));
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

        let msg = ServerMessage::PacketReceived {
            client_id: 7,
            packet: Packet::CreateSession,
        };
        assert!(tx.send(msg).is_ok());

        match rx.try_recv().unwrap() {
            ServerMessage::PacketReceived { client_id, packet } => {
                assert_eq!(client_id, 7);
                assert_eq!(packet, Packet::CreateSession);
            }
            _ => panic!("Unexpected message type"),
        }
    }

    async fn connect(addr: SocketAddr) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_packet(
            &mut stream,
            &Packet::Connect {
                client_version: PROTOCOL_VERSION,
            },
        )
        .await
        .unwrap();
        stream
    }

    async fn next(stream: &mut TcpStream) -> Packet {
        tokio::time::timeout(Duration::from_secs(5), read_packet(stream))
            .await
            .expect("timed out waiting for packet")
            .unwrap()
            .expect("connection closed")
    }

    async fn spawn_server(max_clients: usize) -> SocketAddr {
        let mut server = Server::new("127.0.0.1:0", max_clients).await.unwrap();
        let addr = server.local_addr();
        tokio::spawn(async move { server.run().await });
        addr
    }

    #[tokio::test]
    async fn test_handshake_assigns_client_id() {
        let addr = spawn_server(4).await;
        let mut stream = connect(addr).await;

        assert!(matches!(next(&mut stream).await, Packet::Connected { .. }));
    }

    #[tokio::test]
    async fn test_wrong_protocol_version_refused() {
        let addr = spawn_server(4).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_packet(&mut stream, &Packet::Connect { client_version: 99 })
            .await
            .unwrap();

        assert!(matches!(
            next(&mut stream).await,
            Packet::Disconnected { .. }
        ));
    }

    #[tokio::test]
    async fn test_server_full_refused() {
        let addr = spawn_server(1).await;
        let mut first = connect(addr).await;
        assert!(matches!(next(&mut first).await, Packet::Connected { .. }));

        let mut second = TcpStream::connect(addr).await.unwrap();
        assert_eq!(
            next(&mut second).await,
            Packet::Disconnected {
                reason: "Server full".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_actions_before_handshake_ignored() {
        let addr = spawn_server(4).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        write_packet(&mut stream, &Packet::CreateSession).await.unwrap();
        write_packet(
            &mut stream,
            &Packet::Connect {
                client_version: PROTOCOL_VERSION,
            },
        )
        .await
        .unwrap();

        // The early CreateSession produced nothing; the first reply is Connected.
        assert!(matches!(next(&mut stream).await, Packet::Connected { .. }));

        write_packet(&mut stream, &Packet::CreateSession).await.unwrap();
        assert!(matches!(
            next(&mut stream).await,
            Packet::SessionCreated { .. }
        ));
    }
}
