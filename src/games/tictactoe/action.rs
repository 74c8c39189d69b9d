//! Errors raised while validating or applying a move.

use crate::db::DbError;
use crate::store::StoreError;

/// Error that can occur when driving a game.
///
/// The first four variants are user-correctable and leave every piece of
/// state untouched. Persistence variants are reported by the layers that
/// own storage; the turn logic itself never fails on them.
#[derive(Debug, Clone, derive_more::Display)]
pub enum GameError {
    /// The cell is out of range or already occupied.
    #[display("Cell {} is out of range or already occupied", _0)]
    InvalidMove(usize),

    /// The mover is not the side whose turn it is.
    #[display("It is not this side's turn to move")]
    OutOfTurn,

    /// The game has ended; start a new one.
    #[display("The game is already over")]
    GameAlreadyOver,

    /// A strategy was asked to move on a full board.
    #[display("No empty cell is left to play")]
    NoMoveAvailable,

    /// The queried identity has no record.
    #[display("No record found for '{}'", _0)]
    NotFound(String),

    /// Session persistence failed.
    #[display("Session store error: {}", _0)]
    Store(StoreError),

    /// Ledger persistence failed.
    #[display("Ledger error: {}", _0)]
    Ledger(DbError),
}

impl std::error::Error for GameError {}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<DbError> for GameError {
    fn from(err: DbError) -> Self {
        Self::Ledger(err)
    }
}
