//! Tic-tac-toe: board, rules, session state machine and opponent strategies.

mod action;
mod position;
pub mod rules;
mod session;
mod strategy;
mod types;

pub use action::GameError;
pub use position::Position;
pub use session::{Outcome, Session, Turn};
pub use strategy::{Difficulty, GreedyStrategy, MixedStrategy, MoveStrategy, RandomStrategy};
pub use types::{Board, CELL_COUNT, Mark, Square};
