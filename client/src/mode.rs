//! Routing of player commands to exactly one responder
//!
//! A client runs either against the local AI or against the server, chosen
//! once at startup. Both responders answer with the same notification
//! packets, so the mirror and the renderer never need to know which one is
//! in play.

use crate::ai;
use crate::game::ClientGameState;
use crate::input::Command;
use log::debug;
use shared::{Board, BoardError, Mark, Outcome, Packet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("you are not in a session")]
    NoSession,
    #[error("`{0}` is only available when playing online")]
    OnlineOnly(&'static str),
    #[error("the game is over, type `restart` to play again")]
    GameOver,
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// What the caller should do with a routed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Notifications produced by the local responder, in order
    Local(Vec<Packet>),
    /// Packet to send to the server
    Remote(Packet),
    Help,
    Quit,
}

/// Offline game: the human plays the first mark, the AI answers at once
#[derive(Debug, Clone, Default)]
pub struct LocalGame {
    board: Board,
    finished: bool,
}

impl LocalGame {
    pub const HUMAN: Mark = Mark::FIRST;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Notifications that open a local game.
    pub fn start(&self) -> Vec<Packet> {
        vec![Packet::GameStarted { first: Self::HUMAN }]
    }

    /// Plays the human's move and the AI's answer.
    pub fn play(&mut self, cell: usize) -> Result<Vec<Packet>, CommandError> {
        if self.finished {
            return Err(CommandError::GameOver);
        }

        self.board.apply_mark(cell, Self::HUMAN)?;
        let mut notifications = vec![Packet::MoveMade {
            cell,
            mark: Self::HUMAN,
        }];
        if self.finish_turn(Self::HUMAN, &mut notifications) {
            return Ok(notifications);
        }

        let ai_mark = Self::HUMAN.opponent();
        if let Some(reply) = ai::best_move(&self.board, ai_mark) {
            self.board.apply_mark(reply, ai_mark)?;
            debug!("AI plays cell {}", reply);
            notifications.push(Packet::MoveMade {
                cell: reply,
                mark: ai_mark,
            });
            self.finish_turn(ai_mark, &mut notifications);
        }

        Ok(notifications)
    }

    pub fn restart(&mut self) -> Vec<Packet> {
        self.board.clear();
        self.finished = false;
        vec![Packet::Restarted]
    }

    /// Emits the outcome of `mover`'s move. Returns true if the game ended.
    fn finish_turn(&mut self, mover: Mark, notifications: &mut Vec<Packet>) -> bool {
        match self.board.evaluate() {
            Outcome::Won { mark, line } => notifications.push(Packet::GameWon { mark, line }),
            Outcome::Draw => notifications.push(Packet::GameDraw),
            Outcome::InProgress => {
                notifications.push(Packet::TurnChanged {
                    mark: mover.opponent(),
                });
                return false;
            }
        }

        self.finished = true;
        true
    }
}

/// Which responder answers player commands
#[derive(Debug, Clone)]
pub enum Mode {
    Local(LocalGame),
    Networked,
}

impl Mode {
    /// Hands `command` to this mode's responder.
    ///
    /// In networked mode the server decides legality, so only commands that
    /// need a session code are checked here.
    pub fn route(
        &mut self,
        command: Command,
        state: &ClientGameState,
    ) -> Result<Route, CommandError> {
        match self {
            Mode::Local(game) => match command {
                Command::Move(cell) => game.play(cell).map(Route::Local),
                Command::Restart => Ok(Route::Local(game.restart())),
                Command::Create => Err(CommandError::OnlineOnly("create")),
                Command::Join(_) => Err(CommandError::OnlineOnly("join")),
                Command::Leave => Err(CommandError::OnlineOnly("leave")),
                Command::Help => Ok(Route::Help),
                Command::Quit => Ok(Route::Quit),
            },

            Mode::Networked => {
                let packet = match command {
                    Command::Create => Packet::CreateSession,
                    Command::Join(code) => Packet::JoinSession { code },
                    Command::Leave => Packet::LeaveSession,
                    Command::Restart => Packet::RestartSession {
                        code: state.code.clone().ok_or(CommandError::NoSession)?,
                    },
                    Command::Move(cell) => {
                        let code = state.code.clone().ok_or(CommandError::NoSession)?;
                        let mark = state.my_mark.ok_or(CommandError::NoSession)?;
                        Packet::MakeMove { code, cell, mark }
                    }
                    Command::Help => return Ok(Route::Help),
                    Command::Quit => return Ok(Route::Quit),
                };
                Ok(Route::Remote(packet))
            }
        }
    }
}
