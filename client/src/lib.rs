//! # Tic-Tac-Toe Client Library
//!
//! This library provides the terminal client for the tic-tac-toe relay. The
//! player types commands on stdin and sees the board redrawn as notifications
//! arrive.
//!
//! ## Architecture Overview
//!
//! ### Notification-Driven Mirror
//! The client keeps a copy of the board purely for display. It never places a
//! mark on its own: every change arrives as a notification, either from the
//! server or from the local AI. A move the server rejects therefore never
//! shows up on screen.
//!
//! ### Two Mutually Exclusive Modes
//! At startup the client picks one responder for the whole run:
//! - **Local**: the human plays X against a minimax AI, with no network
//! - **Networked**: every command goes to the server over TCP
//!
//! Both responders produce the same notification packets, so the rest of the
//! client does not care which one is active.
//!
//! ## Module Organization
//!
//! ### AI Module (`ai`)
//! Exhaustive minimax over the remaining cells, preferring faster wins.
//!
//! ### Game Module (`game`)
//! The client-side mirror of the session: board, turn, own mark and status.
//!
//! ### Input Module (`input`)
//! Parses typed lines such as `join 123456` or `move 4` into commands.
//!
//! ### Mode Module (`mode`)
//! Routes each command to the local AI or to the server, never both.
//!
//! ### Network Module (`network`)
//! Handshake, reader task, and the main loop multiplexing stdin with server
//! packets.
//!
//! ### Rendering Module (`rendering`)
//! Text rendering of the board, status line and event messages.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:3000").await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod game;
pub mod input;
pub mod mode;
pub mod network;
pub mod rendering;
