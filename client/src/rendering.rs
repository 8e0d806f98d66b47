use crate::game::{ClientGameState, Status};
use shared::{Board, Mark, Packet};
use std::io::{self, Write};

/// Draws the board as a 3x3 grid. Empty cells show their index so the
/// player knows what to type; cells of `highlight` are bracketed.
pub fn render_board(board: &Board, highlight: Option<[usize; 3]>) -> String {
    let mut out = String::new();

    for (row, contents) in board.cells().chunks(3).enumerate() {
        if row > 0 {
            out.push_str("-----+-----+-----\n");
        }
        let cells: Vec<String> = contents
            .iter()
            .enumerate()
            .map(|(col, content)| {
                let cell = row * 3 + col;
                let symbol = match content {
                    Some(mark) => mark.to_string(),
                    None => cell.to_string(),
                };
                if highlight.is_some_and(|line| line.contains(&cell)) {
                    format!("[{}]", symbol)
                } else {
                    format!(" {} ", symbol)
                }
            })
            .collect();
        out.push(' ');
        out.push_str(&cells.join("  |  "));
        out.push('\n');
    }

    out
}

/// One line describing where the player stands.
pub fn render_status(state: &ClientGameState) -> String {
    let me = |mark: Mark| {
        if state.my_mark == Some(mark) {
            "you"
        } else {
            "opponent"
        }
    };

    let mut status = match state.status {
        Status::Idle => "Not in a session. Type `create` or `join <code>`.".to_string(),
        Status::WaitingForOpponent => match &state.code {
            Some(code) => format!("Session {} created. Waiting for an opponent...", code),
            None => "Waiting for an opponent...".to_string(),
        },
        Status::Playing if state.is_my_turn() => format!("Your turn ({}).", state.turn),
        Status::Playing => format!("Waiting for {} ({}).", me(state.turn), state.turn),
        Status::Won { mark, .. } => format!("{} wins ({})! Type `restart` to play again.", capitalize(me(mark)), mark),
        Status::Draw => "It's a draw! Type `restart` to play again.".to_string(),
        Status::OpponentLeft => "Your opponent left. The session is closed.".to_string(),
    };

    if let Some(reason) = state.last_rejection {
        status = format!("Rejected: {}. {}", reason, status);
    }

    status
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Short event line for a notification, if it deserves one.
pub fn describe(packet: &Packet) -> Option<String> {
    match packet {
        Packet::Connected { client_id } => Some(format!("Connected as client {}", client_id)),
        Packet::SessionCreated { code } => Some(format!("Share this code with your opponent: {}", code)),
        Packet::SessionJoined { code } => Some(format!("Joined session {}", code)),
        Packet::GameStarted { first } => Some(format!("Game started, {} moves first", first)),
        Packet::MoveMade { cell, mark } => Some(format!("{} took cell {}", mark, cell)),
        Packet::Restarted => Some("Board cleared".to_string()),
        Packet::Disconnected { reason } => Some(format!("Disconnected by server: {}", reason)),
        _ => None,
    }
}

/// Writes game output to a terminal or any other writer
pub struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Shows the event line for `packet` and then the updated game.
    pub fn notification(&mut self, packet: &Packet, state: &ClientGameState) -> io::Result<()> {
        if let Some(line) = describe(packet) {
            writeln!(self.out, "{}", line)?;
        }

        match packet {
            // The follow-up notification redraws the board.
            Packet::MoveMade { .. } => Ok(()),
            _ => self.render(state),
        }
    }

    pub fn render(&mut self, state: &ClientGameState) -> io::Result<()> {
        if state.status != Status::Idle && state.status != Status::OpponentLeft {
            write!(self.out, "\n{}\n", render_board(&state.board, state.winning_line()))?;
        }
        writeln!(self.out, "{}", render_status(state))?;
        self.out.flush()
    }

    pub fn message(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
