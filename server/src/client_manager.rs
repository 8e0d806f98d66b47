//! Connection bookkeeping for the transport layer
//!
//! This module tracks every open TCP connection on the server side:
//! - Participant ID assignment and capacity limits
//! - Handshake state (a connection may only act once it has said `Connect`)
//! - The outbound queue feeding each connection's writer task
//!
//! It knows nothing about sessions. The coordinator addresses participants by
//! ID and the client manager turns those IDs into queued packets.

use crate::registry::ParticipantId;
use log::{info, warn};
use shared::Packet;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// A connected client and its outbound queue
#[derive(Debug)]
pub struct Client {
    /// Participant identifier assigned by the server
    pub id: ParticipantId,
    /// Peer address, kept for logging
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
    /// Set once a `Connect` with a supported protocol version arrived
    pub handshake_complete: bool,
    sender: mpsc::UnboundedSender<Packet>,
}

impl Client {
    pub fn new(id: ParticipantId, addr: SocketAddr, sender: mpsc::UnboundedSender<Packet>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            handshake_complete: false,
            sender,
        }
    }

    /// Queues a packet for the writer task. Returns false if the writer is gone.
    pub fn send(&self, packet: Packet) -> bool {
        self.sender.send(packet).is_ok()
    }
}

/// Registry of open connections
///
/// Client IDs start at 1 and are never reused while the server runs, so a
/// late message from a dropped connection can never be mistaken for a newer
/// one.
pub struct ClientManager {
    clients: HashMap<ParticipantId, Client>,
    next_client_id: ParticipantId,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection.
    ///
    /// Returns `None` when the server is at capacity.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Packet>,
    ) -> Option<ParticipantId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, sender));

        Some(client_id)
    }

    /// Drops a connection. Returns false if it was already gone.
    ///
    /// Dropping the client drops its sender, which ends the writer task once
    /// the queued packets are flushed.
    pub fn remove_client(&mut self, client_id: &ParticipantId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} ({}) disconnected after {:?}",
                client.id,
                client.addr,
                client.connected_at.elapsed()
            );
            true
        } else {
            false
        }
    }

    pub fn complete_handshake(&mut self, client_id: ParticipantId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.handshake_complete = true;
                true
            }
            None => false,
        }
    }

    pub fn is_handshake_complete(&self, client_id: ParticipantId) -> bool {
        self.clients
            .get(&client_id)
            .is_some_and(|client| client.handshake_complete)
    }

    /// Queues a packet for one client. Returns false if it could not be queued.
    pub fn send_to(&self, client_id: ParticipantId, packet: Packet) -> bool {
        match self.clients.get(&client_id) {
            Some(client) => {
                let queued = client.send(packet);
                if !queued {
                    warn!("Writer for client {} is gone", client_id);
                }
                queued
            }
            None => false,
        }
    }

    pub fn contains(&self, client_id: ParticipantId) -> bool {
        self.clients.contains_key(&client_id)
    }

    pub fn addr_of(&self, client_id: ParticipantId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
