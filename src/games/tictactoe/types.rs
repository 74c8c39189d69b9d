//! Core domain types for tic-tac-toe.

use super::action::GameError;
use super::rules;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// A mark placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Mark X (moves first).
    X,
    /// Mark O (moves second).
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark in this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

impl From<Option<Mark>> for Square {
    fn from(mark: Option<Mark>) -> Self {
        mark.map_or(Square::Empty, Square::Occupied)
    }
}

/// 3x3 tic-tac-toe board.
///
/// Cells are indexed 0-8 in row-major order. The shape never changes; the
/// only mutation is [`Board::place_mark`] into an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; CELL_COUNT],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from per-cell marks (`None` for empty).
    pub fn from_marks(marks: [Option<Mark>; CELL_COUNT]) -> Self {
        Self {
            squares: marks.map(Square::from),
        }
    }

    /// Returns the per-cell marks (`None` for empty).
    pub fn to_marks(&self) -> [Option<Mark>; CELL_COUNT] {
        self.squares.map(Square::mark)
    }

    /// Gets the square at the given cell (0-8).
    pub fn get(&self, cell: usize) -> Option<Square> {
        self.squares.get(cell).copied()
    }

    /// Checks if a cell is in range and empty.
    pub fn is_empty(&self, cell: usize) -> bool {
        matches!(self.get(cell), Some(Square::Empty))
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; CELL_COUNT] {
        &self.squares
    }

    /// Places `mark` into `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidMove`] if the cell is out of range or
    /// already occupied. The board is left untouched in that case.
    #[instrument(skip(self))]
    pub fn place_mark(&mut self, cell: usize, mark: Mark) -> Result<(), GameError> {
        if !self.is_empty(cell) {
            warn!(cell, ?mark, "Rejected placement");
            return Err(GameError::InvalidMove(cell));
        }
        self.squares[cell] = Square::Occupied(mark);
        Ok(())
    }

    /// True iff some row, column or diagonal is entirely `mark`.
    pub fn check_winner(&self, mark: Mark) -> bool {
        rules::has_three_in_a_row(self, mark)
    }

    /// True iff no empty cell remains.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// Indices of the empty cells, ascending.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELL_COUNT).filter(|&cell| self.is_empty(cell)).collect()
    }

    /// Number of cells holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(mark))
            .count()
    }

    /// Checks the alternation invariant: X moves first, so the X count
    /// minus the O count is always 0 or 1.
    pub fn is_consistent(&self) -> bool {
        let x = self.count(Mark::X);
        let o = self.count(Mark::O);
        x == o || x == o + 1
    }

    /// Formats the board as a human-readable string.
    ///
    /// Empty cells show their 1-based number so a player can read off the
    /// move to type.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let cell = row * 3 + col;
                let symbol = match self.squares[cell] {
                    Square::Empty => (cell + 1).to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push(' ');
                result.push_str(&symbol);
                result.push(' ');
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n---+---+---\n");
            }
        }
        result
    }
}
