//! Error taxonomy for session actions
//!
//! Every variant is recoverable: the coordinator turns it into an
//! `ActionRejected` packet for the acting participant and leaves all session
//! state untouched.

use crate::registry::ParticipantId;
use shared::{BoardError, Mark, RejectReason, SessionCode};
use thiserror::Error;

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("session is not in play")]
    NotActive,
    #[error("it is {expected}'s turn")]
    WrongTurn { expected: Mark },
    #[error("participant plays {assigned}, not {claimed}")]
    WrongMark { assigned: Mark, claimed: Mark },
    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no session with code {0}")]
    RoomNotFound(SessionCode),
    #[error("session {0} already has two participants")]
    RoomFull(SessionCode),
    #[error("illegal move: {0}")]
    IllegalMove(#[from] MoveError),
    #[error("participant {0} is not bound to that session")]
    NotBound(ParticipantId),
    #[error("participant {participant} is already bound to session {code}")]
    AlreadyBound {
        participant: ParticipantId,
        code: SessionCode,
    },
}

impl From<BoardError> for SessionError {
    fn from(error: BoardError) -> Self {
        SessionError::IllegalMove(MoveError::Board(error))
    }
}

impl From<&SessionError> for RejectReason {
    fn from(error: &SessionError) -> Self {
        match error {
            SessionError::RoomNotFound(_) => RejectReason::RoomNotFound,
            SessionError::RoomFull(_) => RejectReason::RoomFull,
            SessionError::IllegalMove(_) => RejectReason::IllegalMove,
            SessionError::NotBound(_) => RejectReason::NotBound,
            SessionError::AlreadyBound { .. } => RejectReason::AlreadyBound,
        }
    }
}
