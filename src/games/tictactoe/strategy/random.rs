//! Easy tier: uniformly random empty cell.

use super::MoveStrategy;
use crate::games::tictactoe::action::GameError;
use crate::games::tictactoe::types::{Board, Mark};
use rand::RngCore;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Picks any empty cell with equal probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomStrategy;

impl RandomStrategy {
    /// Uniformly samples one of `board`'s empty cells.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoMoveAvailable`] if the board is full.
    #[instrument(skip(rng))]
    pub fn pick(board: &Board, rng: &mut dyn RngCore) -> Result<usize, GameError> {
        let cell = board
            .empty_cells()
            .choose(rng)
            .copied()
            .ok_or(GameError::NoMoveAvailable)?;
        debug!(cell, "Random cell chosen");
        Ok(cell)
    }
}

impl MoveStrategy for RandomStrategy {
    fn select_move(
        &self,
        board: &Board,
        _own: Mark,
        _opponent: Mark,
        rng: &mut dyn RngCore,
    ) -> Result<usize, GameError> {
        Self::pick(board, rng)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_only_returns_empty_cells() {
        let mut board = Board::new();
        for (cell, mark) in [(0, Mark::X), (4, Mark::O), (8, Mark::X), (2, Mark::O)] {
            board.place_mark(cell, mark).unwrap();
        }
        let empty = board.empty_cells();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let cell = RandomStrategy
                .select_move(&board, Mark::O, Mark::X, &mut rng)
                .unwrap();
            assert!(empty.contains(&cell));
        }
    }

    #[test]
    fn test_full_board_has_no_move() {
        let mut board = Board::new();
        for (cell, mark) in "XOXXOOOXX".chars().enumerate() {
            let mark = if mark == 'X' { Mark::X } else { Mark::O };
            board.place_mark(cell, mark).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        let result = RandomStrategy.select_move(&board, Mark::O, Mark::X, &mut rng);
        assert!(matches!(result, Err(GameError::NoMoveAvailable)));
    }
}
