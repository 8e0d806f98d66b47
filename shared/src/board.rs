//! Board model shared by the coordinator, the client mirror and the AI.
//!
//! The board is a plain value: nine cells in row-major order, each either
//! empty or holding a [`Mark`]. Win and draw are derived on demand by
//! [`Board::evaluate`], never stored.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// Winning triples in scan order: rows, then columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A game symbol. `X` is always the host's mark and always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The mark that opens every game and every restart.
    pub const FIRST: Mark = Mark::X;

    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Reasons a mark cannot be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell {0} is outside the board")]
    OutOfRange(usize),
    #[error("cell {0} is already taken")]
    Occupied(usize),
}

/// Result of evaluating a board position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    /// `line` is the first completed triple in [`WINNING_LINES`] order.
    Won { mark: Mark, line: [usize; 3] },
    Draw,
}

impl Outcome {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Content of one square: empty or holding a mark.
pub type Cell = Option<Mark>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the content of a cell, or `None` for empty and out-of-range cells.
    pub fn get(&self, cell: usize) -> Cell {
        self.cells.get(cell).copied().flatten()
    }

    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    /// Places `mark` on `cell`.
    ///
    /// Fails without touching the board when the index is outside `0..9` or
    /// the cell already holds a mark. Previously set cells are never altered.
    pub fn apply_mark(&mut self, cell: usize, mark: Mark) -> Result<(), BoardError> {
        let slot = self
            .cells
            .get_mut(cell)
            .ok_or(BoardError::OutOfRange(cell))?;

        if slot.is_some() {
            return Err(BoardError::Occupied(cell));
        }

        *slot = Some(mark);
        Ok(())
    }

    /// Copying variant of [`Board::apply_mark`]; `self` is left untouched.
    pub fn with_mark(&self, cell: usize, mark: Mark) -> Result<Board, BoardError> {
        let mut next = *self;
        next.apply_mark(cell, mark)?;
        Ok(next)
    }

    pub fn clear(&mut self) {
        self.cells = [None; BOARD_CELLS];
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Indices of the cells that can still be played, in ascending order.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    /// Scans the winning triples in fixed order and reports the first complete
    /// one. A full board without a completed triple is a draw.
    pub fn evaluate(&self) -> Outcome {
        for line in WINNING_LINES {
            let [a, b, c] = line;
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Outcome::Won { mark, line };
                }
            }
        }

        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }
}
