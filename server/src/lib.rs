//! # Tic-Tac-Toe Relay Server Library
//!
//! This library provides the authoritative server for networked two-player
//! tic-tac-toe. It pairs clients into sessions addressed by six-digit codes,
//! validates every move against the session board, and relays the resulting
//! notifications to both participants.
//!
//! ## Core Responsibilities
//!
//! ### Session Coordination
//! The server holds the only authoritative copy of each board. A client asks
//! for a move; the server decides whether it is legal, applies it, and tells
//! both participants what happened. Clients never change their own boards
//! without a server notification.
//!
//! ### Client Management
//! Handles the lifecycle of TCP connections including:
//! - Participant ID assignment and capacity limits
//! - The `Connect` handshake with protocol version check
//! - Disconnection handling, which closes any session the client was in
//!
//! ### Notification Fan-out
//! Every accepted action produces notifications addressed either to the acting
//! participant alone or to everyone in the session. Per-connection writer
//! tasks deliver them in the order they were produced.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Socket tasks only decode frames and forward them over a channel. The main
//! loop owns the [`coordinator::Coordinator`] and applies actions one at a
//! time, so no two actions ever interleave on the same session.
//!
//! ### TCP-Based Communication
//! Each message is a bincode-encoded [`shared::Packet`] behind a 4-byte
//! length prefix. TCP gives the in-order delivery the session protocol
//! depends on and reports disconnects as end-of-stream.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Owns every live session and the participant-to-session bindings, and
//! allocates unique session codes.
//!
//! ### Game Module (`game`)
//! The per-session state machine: seats, turn order, move validation and
//! restart.
//!
//! ### Coordinator Module (`coordinator`)
//! Turns participant actions into registry updates plus outbound
//! notifications, and rejects invalid actions with a reason.
//!
//! ### Client Manager Module (`client_manager`)
//! Tracks open connections and their outbound queues.
//!
//! ### Network Module (`network`)
//! The TCP acceptor, per-connection reader and writer tasks, and the main
//! event loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // Bind to the default port and accept up to 256 connections
//!     let mut server = Server::new("127.0.0.1:3000", 256).await?;
//!
//!     // Runs until the process is stopped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod network;
pub mod registry;
