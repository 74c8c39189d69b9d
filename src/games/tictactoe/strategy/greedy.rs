//! Hard tier: fixed priority list, no randomness.

use super::MoveStrategy;
use crate::games::tictactoe::action::GameError;
use crate::games::tictactoe::position::Position;
use crate::games::tictactoe::rules::completing_move;
use crate::games::tictactoe::types::{Board, Mark};
use rand::RngCore;
use tracing::{debug, instrument};

/// Deterministic single-ply heuristic.
///
/// Priority: win, block, center, first free corner (0, 2, 6, 8), first
/// free cell. It cannot see double threats, so a fork beats it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl GreedyStrategy {
    /// Selects a move without any random input.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoMoveAvailable`] if the board is full.
    #[instrument]
    pub fn choose(board: &Board, own: Mark, opponent: Mark) -> Result<usize, GameError> {
        if let Some(cell) = completing_move(board, own) {
            debug!(cell, "Taking the win");
            return Ok(cell);
        }
        if let Some(cell) = completing_move(board, opponent) {
            debug!(cell, "Blocking");
            return Ok(cell);
        }

        let center = Position::Center.to_index();
        if board.is_empty(center) {
            debug!("Claiming the center");
            return Ok(center);
        }

        if let Some(corner) = Position::CORNERS
            .iter()
            .map(|pos| pos.to_index())
            .find(|&cell| board.is_empty(cell))
        {
            debug!(cell = corner, "Fortifying a corner");
            return Ok(corner);
        }

        board
            .empty_cells()
            .first()
            .copied()
            .ok_or(GameError::NoMoveAvailable)
    }
}

impl MoveStrategy for GreedyStrategy {
    fn select_move(
        &self,
        board: &Board,
        own: Mark,
        opponent: Mark,
        _rng: &mut dyn RngCore,
    ) -> Result<usize, GameError> {
        Self::choose(board, own, opponent)
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}
