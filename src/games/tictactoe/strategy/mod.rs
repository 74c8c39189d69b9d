//! Opponent move selection.
//!
//! Each difficulty tier maps to one [`MoveStrategy`]. Strategies are pure
//! functions of the board, both marks and an injected random source, so a
//! seeded RNG makes every tier reproducible.

mod greedy;
mod mixed;
mod random;

pub use greedy::GreedyStrategy;
pub use mixed::MixedStrategy;
pub use random::RandomStrategy;

use super::action::GameError;
use super::types::{Board, Mark};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Opponent difficulty tier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Uniformly random moves.
    Easy,
    /// Mostly sensible, sometimes careless.
    #[default]
    Medium,
    /// Greedy single-ply heuristic.
    Hard,
}

impl Difficulty {
    /// The strategy that plays at this tier.
    pub fn strategy(self) -> &'static dyn MoveStrategy {
        match self {
            Difficulty::Easy => &RandomStrategy,
            Difficulty::Medium => &MixedStrategy::STANDARD,
            Difficulty::Hard => &GreedyStrategy,
        }
    }

    /// A short flavour line describing the opponent at this tier.
    pub fn description(self) -> &'static str {
        match self {
            Difficulty::Easy => "A squire in training, who makes random moves.",
            Difficulty::Medium => "A knight of moderate skill, who sometimes makes mistakes.",
            Difficulty::Hard => "The royal champion, who seldom misses a threat.",
        }
    }
}

/// A move-selection policy.
pub trait MoveStrategy: std::fmt::Debug + Send + Sync {
    /// Picks an empty cell for `own` to play.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoMoveAvailable`] if the board is full.
    fn select_move(
        &self,
        board: &Board,
        own: Mark,
        opponent: Mark,
        rng: &mut dyn RngCore,
    ) -> Result<usize, GameError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}
