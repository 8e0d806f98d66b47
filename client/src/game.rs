use log::debug;
use shared::{Board, Mark, Packet, RejectReason, SessionCode};

/// Where the local player stands, as far as notifications have told us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not in a session
    Idle,
    /// Hosting a session nobody has joined yet
    WaitingForOpponent,
    Playing,
    Won { mark: Mark, line: [usize; 3] },
    Draw,
    OpponentLeft,
}

/// Client-side mirror of one session
///
/// The mirror only changes in response to notifications, whether they came
/// from the server or from the local AI responder. It never decides whether
/// a move is legal.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub client_id: Option<u32>,
    pub code: Option<SessionCode>,
    pub my_mark: Option<Mark>,
    pub board: Board,
    pub turn: Mark,
    pub status: Status,
    pub last_rejection: Option<RejectReason>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            code: None,
            my_mark: None,
            board: Board::new(),
            turn: Mark::FIRST,
            status: Status::Idle,
            last_rejection: None,
        }
    }

    /// Mirror for an offline game: the human always plays the first mark.
    pub fn local() -> Self {
        Self {
            my_mark: Some(Mark::FIRST),
            status: Status::Playing,
            ..Self::new()
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.status == Status::Playing && self.my_mark == Some(self.turn)
    }

    /// Highlighted cells when the game was won.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        match self.status {
            Status::Won { line, .. } => Some(line),
            _ => None,
        }
    }

    /// Applies one notification to the mirror.
    pub fn apply(&mut self, packet: &Packet) {
        match packet {
            Packet::Connected { client_id } => {
                self.client_id = Some(*client_id);
            }

            Packet::SessionCreated { code } => {
                self.reset_session();
                self.code = Some(code.clone());
                self.my_mark = Some(Mark::FIRST);
                self.status = Status::WaitingForOpponent;
            }

            Packet::SessionJoined { code } => {
                // The host already knows its code; only the joiner learns it here.
                if self.code.as_ref() != Some(code) {
                    self.reset_session();
                    self.code = Some(code.clone());
                    self.my_mark = Some(Mark::FIRST.opponent());
                }
            }

            Packet::GameStarted { first } => {
                self.board.clear();
                self.turn = *first;
                self.status = Status::Playing;
            }

            Packet::MoveMade { cell, mark } => {
                if let Err(e) = self.board.apply_mark(*cell, *mark) {
                    debug!("Mirror out of step with coordinator: {}", e);
                }
            }

            Packet::TurnChanged { mark } => {
                self.turn = *mark;
            }

            Packet::GameWon { mark, line } => {
                self.status = Status::Won {
                    mark: *mark,
                    line: *line,
                };
            }

            Packet::GameDraw => {
                self.status = Status::Draw;
            }

            Packet::Restarted => {
                self.board.clear();
                self.turn = Mark::FIRST;
                self.status = Status::Playing;
            }

            Packet::OpponentLeft => {
                self.reset_session();
                self.status = Status::OpponentLeft;
            }

            Packet::ActionRejected { reason } => {
                self.last_rejection = Some(*reason);
                return;
            }

            other => {
                debug!("Ignoring {:?} in mirror", other);
            }
        }

        self.last_rejection = None;
    }

    /// Forgets the current session after leaving it ourselves.
    pub fn leave(&mut self) {
        self.reset_session();
        self.status = Status::Idle;
    }

    fn reset_session(&mut self) {
        self.code = None;
        self.my_mark = None;
        self.board.clear();
        self.turn = Mark::FIRST;
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
