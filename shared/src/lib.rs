use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod board;
pub mod codec;

pub use board::{Board, BoardError, Cell, Mark, Outcome, BOARD_CELLS, WINNING_LINES};
pub use codec::{encode_packet, read_packet, write_packet, FrameError, MAX_FRAME_LEN};

pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 3000;

/// Smallest and largest session codes handed out by the server.
pub const MIN_SESSION_CODE: u32 = 100_000;
pub const MAX_SESSION_CODE: u32 = 999_999;

/// Short, human-typeable session address: six ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionCode(String);

impl SessionCode {
    pub const LEN: usize = 6;

    /// Builds a code from a number in `MIN_SESSION_CODE..=MAX_SESSION_CODE`.
    pub fn from_number(number: u32) -> Self {
        debug_assert!(
            (MIN_SESSION_CODE..=MAX_SESSION_CODE).contains(&number),
            "session code {} out of range",
            number
        );
        Self(format!("{:06}", number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session codes are exactly 6 digits, got {0:?}")]
pub struct InvalidSessionCode(pub String);

impl FromStr for SessionCode {
    type Err = InvalidSessionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == Self::LEN && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidSessionCode(trimmed.to_string()))
        }
    }
}

/// Why the coordinator refused an action. Sent only to the acting participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    RoomNotFound,
    RoomFull,
    IllegalMove,
    NotBound,
    AlreadyBound,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::RoomNotFound => "room does not exist",
            RejectReason::RoomFull => "room is full",
            RejectReason::IllegalMove => "illegal move",
            RejectReason::NotBound => "not in that room",
            RejectReason::AlreadyBound => "already in a room",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    CreateSession,
    JoinSession {
        code: SessionCode,
    },
    MakeMove {
        code: SessionCode,
        cell: usize,
        mark: Mark,
    },
    RestartSession {
        code: SessionCode,
    },
    LeaveSession,
    Disconnect,

    Connected {
        client_id: u32,
    },
    Disconnected {
        reason: String,
    },
    SessionCreated {
        code: SessionCode,
    },
    SessionJoined {
        code: SessionCode,
    },
    GameStarted {
        first: Mark,
    },
    MoveMade {
        cell: usize,
        mark: Mark,
    },
    TurnChanged {
        mark: Mark,
    },
    GameWon {
        mark: Mark,
        line: [usize; 3],
    },
    GameDraw,
    Restarted,
    OpponentLeft,
    ActionRejected {
        reason: RejectReason,
    },
}

impl Packet {
    /// True for packets only the server sends.
    pub fn is_notification(&self) -> bool {
        !matches!(
            self,
            Packet::Connect { .. }
                | Packet::CreateSession
                | Packet::JoinSession { .. }
                | Packet::MakeMove { .. }
                | Packet::RestartSession { .. }
                | Packet::LeaveSession
                | Packet::Disconnect
        )
    }
}
