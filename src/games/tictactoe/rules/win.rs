//! Win detection logic for tic-tac-toe.

use super::super::{Board, Mark, Square};
use tracing::instrument;

/// The 8 winning lines: rows, then columns, then diagonals.
///
/// The order matters: when several lines offer a completing move, the
/// first line listed here wins the tie.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// True iff any line is fully occupied by `mark`.
pub fn has_three_in_a_row(board: &Board, mark: Mark) -> bool {
    LINES.iter().any(|line| {
        line.iter()
            .all(|&cell| board.get(cell) == Some(Square::Occupied(mark)))
    })
}

/// Returns the mark that owns a full line, if any.
#[instrument]
pub fn check_winner(board: &Board) -> Option<Mark> {
    [Mark::X, Mark::O]
        .into_iter()
        .find(|&mark| has_three_in_a_row(board, mark))
}

/// Finds a cell that completes three-in-a-row for `mark`.
///
/// A line qualifies when exactly one of its cells is empty and the other
/// two hold `mark`. Lines are scanned in [`LINES`] order. The same check
/// run for the other side's mark yields the cell that blocks it.
#[instrument]
pub fn completing_move(board: &Board, mark: Mark) -> Option<usize> {
    LINES.iter().find_map(|line| {
        let mut owned = 0;
        let mut empty = None;
        for &cell in line {
            match board.get(cell) {
                Some(Square::Occupied(m)) if m == mark => owned += 1,
                Some(Square::Empty) if empty.is_none() => empty = Some(cell),
                _ => return None,
            }
        }
        if owned == 2 { empty } else { None }
    })
}
