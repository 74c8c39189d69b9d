//! Medium tier: win, sometimes block, take the center, otherwise random.

use super::{MoveStrategy, RandomStrategy};
use crate::games::tictactoe::action::GameError;
use crate::games::tictactoe::position::Position;
use crate::games::tictactoe::rules::completing_move;
use crate::games::tictactoe::types::{Board, Mark};
use rand::{Rng, RngCore};
use tracing::{debug, instrument};

/// Mixes the greedy priorities with random play.
///
/// With probability `strategic_chance` the strategy tries, in order: a
/// winning move, then (with probability `block_chance`) a block, then the
/// center. Whenever that finds nothing, or the roll skips strategy
/// altogether, it plays a uniformly random empty cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedStrategy {
    strategic_chance: f64,
    block_chance: f64,
}

impl MixedStrategy {
    /// The Medium tier: 70% strategic, 60% of those willing to block.
    pub const STANDARD: MixedStrategy = MixedStrategy {
        strategic_chance: 0.7,
        block_chance: 0.6,
    };

    /// Creates a strategy with custom probabilities, clamped to `[0, 1]`.
    pub fn new(strategic_chance: f64, block_chance: f64) -> Self {
        Self {
            strategic_chance: clamp_probability(strategic_chance),
            block_chance: clamp_probability(block_chance),
        }
    }

    /// Probability of attempting a strategic move.
    pub fn strategic_chance(&self) -> f64 {
        self.strategic_chance
    }

    /// Probability of blocking when no win is available.
    pub fn block_chance(&self) -> f64 {
        self.block_chance
    }

    fn strategic_move(
        &self,
        board: &Board,
        own: Mark,
        opponent: Mark,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if let Some(cell) = completing_move(board, own) {
            debug!(cell, "Taking the win");
            return Some(cell);
        }
        if rng.gen_bool(self.block_chance) {
            if let Some(cell) = completing_move(board, opponent) {
                debug!(cell, "Blocking");
                return Some(cell);
            }
        }
        let center = Position::Center.to_index();
        if board.is_empty(center) {
            debug!("Claiming the center");
            return Some(center);
        }
        None
    }
}

impl Default for MixedStrategy {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

impl MoveStrategy for MixedStrategy {
    #[instrument(skip(self, rng))]
    fn select_move(
        &self,
        board: &Board,
        own: Mark,
        opponent: Mark,
        rng: &mut dyn RngCore,
    ) -> Result<usize, GameError> {
        if board.is_full() {
            return Err(GameError::NoMoveAvailable);
        }
        if rng.gen_bool(self.strategic_chance) {
            if let Some(cell) = self.strategic_move(board, own, opponent, rng) {
                return Ok(cell);
            }
            debug!("No strategic move, falling back to random");
        }
        RandomStrategy::pick(board, rng)
    }

    fn name(&self) -> &'static str {
        "mixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board_from(layout: &str) -> Board {
        let mut board = Board::new();
        for (cell, c) in layout.chars().enumerate() {
            match c {
                'X' => board.place_mark(cell, Mark::X).unwrap(),
                'O' => board.place_mark(cell, Mark::O).unwrap(),
                _ => {}
            }
        }
        board
    }

    #[test]
    fn test_always_strategic_takes_win_before_block() {
        let strategy = MixedStrategy::new(1.0, 1.0);
        // O can win at 5; X threatens 2.
        let board = board_from("XX.OO.X..");
        let mut rng = StdRng::seed_from_u64(3);
        let cell = strategy
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .unwrap();
        assert_eq!(cell, 5);
    }

    #[test]
    fn test_always_blocking_blocks() {
        let strategy = MixedStrategy::new(1.0, 1.0);
        let board = board_from("XX..O....");
        let mut rng = StdRng::seed_from_u64(11);
        let cell = strategy
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .unwrap();
        assert_eq!(cell, 2);
    }

    #[test]
    fn test_never_blocking_takes_center() {
        let strategy = MixedStrategy::new(1.0, 0.0);
        let board = board_from("XX.......");
        let mut rng = StdRng::seed_from_u64(5);
        let cell = strategy
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .unwrap();
        assert_eq!(cell, 4);
    }

    #[test]
    fn test_no_strategic_option_degrades_to_empty_cell() {
        let strategy = MixedStrategy::new(1.0, 1.0);
        // Center taken, no two-in-a-row anywhere.
        let board = board_from("X...O....");
        let empty = board.empty_cells();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let cell = strategy
                .select_move(&board, Mark::O, Mark::X, &mut rng)
                .unwrap();
            assert!(empty.contains(&cell));
        }
    }

    #[test]
    fn test_probabilities_are_clamped() {
        let strategy = MixedStrategy::new(3.0, -1.0);
        assert_eq!(strategy.strategic_chance(), 1.0);
        assert_eq!(strategy.block_chance(), 0.0);
    }
}
