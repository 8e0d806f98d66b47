use crate::error::{MoveError, SessionError};
use crate::registry::ParticipantId;
use log::info;
use shared::{Board, Mark, Outcome, SessionCode};

/// Seats per session
pub const MAX_PARTICIPANTS: usize = 2;

/// Lifecycle of a session
///
/// `AwaitingSecondPlayer` -> `Active` -> `Finished` -> (restart) `Active`,
/// or -> `Closed` from any state once a participant departs. A restart
/// moves any open session to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingSecondPlayer,
    Active,
    Finished,
    Closed,
}

/// One paired game. Seat 0 is the host and plays [`Mark::FIRST`].
#[derive(Debug, Clone)]
pub struct Session {
    code: SessionCode,
    participants: Vec<ParticipantId>,
    board: Board,
    turn: Mark,
    state: SessionState,
}

/// Read-only snapshot of a session, detached from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub code: SessionCode,
    pub participants: Vec<ParticipantId>,
    pub board: Board,
    pub turn: Mark,
    pub state: SessionState,
}

impl Session {
    pub fn new(code: SessionCode, host: ParticipantId) -> Self {
        Self {
            code,
            participants: vec![host],
            board: Board::new(),
            turn: Mark::FIRST,
            state: SessionState::AwaitingSecondPlayer,
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> ParticipantId {
        self.participants[0]
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= MAX_PARTICIPANTS
    }

    pub fn has_participant(&self, participant: ParticipantId) -> bool {
        self.participants.contains(&participant)
    }

    /// Seat order decides the mark: host plays X, the joiner plays O.
    pub fn mark_of(&self, participant: ParticipantId) -> Option<Mark> {
        match self.participants.iter().position(|p| *p == participant)? {
            0 => Some(Mark::FIRST),
            _ => Some(Mark::FIRST.opponent()),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            code: self.code.clone(),
            participants: self.participants.clone(),
            board: self.board,
            turn: self.turn,
            state: self.state,
        }
    }

    /// Seats the second participant and starts play on a fresh board.
    ///
    /// A lone host may have restarted and moved already, so the board is
    /// cleared before the game is announced.
    pub(crate) fn seat(&mut self, participant: ParticipantId) -> Result<Mark, SessionError> {
        if self.is_full() {
            return Err(SessionError::RoomFull(self.code.clone()));
        }

        self.participants.push(participant);
        self.board.clear();
        self.turn = Mark::FIRST;
        self.state = SessionState::Active;
        info!("Session {} is now active", self.code);
        Ok(Mark::FIRST.opponent())
    }

    /// Applies a move for `participant`, or fails leaving the session as it was.
    ///
    /// Every check runs before the board is touched, so a rejected move never
    /// leaves a partial update behind.
    pub fn apply_move(
        &mut self,
        participant: ParticipantId,
        cell: usize,
        mark: Mark,
    ) -> Result<Outcome, SessionError> {
        let assigned = self
            .mark_of(participant)
            .ok_or(SessionError::NotBound(participant))?;

        if self.state != SessionState::Active {
            return Err(MoveError::NotActive.into());
        }
        if assigned != mark {
            return Err(MoveError::WrongMark {
                assigned,
                claimed: mark,
            }
            .into());
        }
        if self.turn != mark {
            return Err(MoveError::WrongTurn {
                expected: self.turn,
            }
            .into());
        }

        self.board.apply_mark(cell, mark)?;

        let outcome = self.board.evaluate();
        if outcome.is_finished() {
            self.state = SessionState::Finished;
        } else {
            self.turn = self.turn.opponent();
        }

        Ok(outcome)
    }

    /// Starts a fresh game with the host to move, whatever state the
    /// session was in.
    pub fn restart(&mut self) {
        self.board.clear();
        self.turn = Mark::FIRST;
        self.state = SessionState::Active;
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
