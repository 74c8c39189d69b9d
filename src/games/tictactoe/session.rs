//! One player's game against the opponent, and its state machine.

use super::action::GameError;
use super::strategy::Difficulty;
use super::types::{Board, Mark};
use tracing::{debug, info, instrument, warn};

/// Which side is to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    /// The human player.
    Player,
    /// The engine-controlled opponent.
    Opponent,
}

impl Turn {
    /// The mark this side plays. The player always has X and moves first.
    pub fn mark(self) -> Mark {
        match self {
            Turn::Player => Session::PLAYER_MARK,
            Turn::Opponent => Session::OPPONENT_MARK,
        }
    }

    /// The other side.
    pub fn other(self) -> Self {
        match self {
            Turn::Player => Turn::Opponent,
            Turn::Opponent => Turn::Player,
        }
    }
}

/// Outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Moves are still being accepted.
    InProgress,
    /// The player completed a line.
    PlayerWin,
    /// The opponent completed a line.
    OpponentWin,
    /// The board filled with no line completed.
    Draw,
}

impl Outcome {
    /// Terminal outcomes accept no further moves.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// A single player's game state.
///
/// Owned by exactly one player identity. The board only changes through
/// [`Session::apply`], which enforces turn order and terminal states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    player_id: String,
    player_name: Option<String>,
    board: Board,
    whose_turn: Turn,
    difficulty: Difficulty,
    outcome: Outcome,
}

impl Session {
    /// Mark used by the player.
    pub const PLAYER_MARK: Mark = Mark::X;
    /// Mark used by the opponent.
    pub const OPPONENT_MARK: Mark = Mark::O;

    /// Creates a fresh session: empty board, player to move.
    #[instrument(skip(player_id), fields(player_id = %player_id.as_ref()))]
    pub fn new(player_id: impl AsRef<str>, difficulty: Difficulty) -> Self {
        info!(?difficulty, "Creating new session");
        Self {
            player_id: player_id.as_ref().to_string(),
            player_name: None,
            board: Board::new(),
            whose_turn: Turn::Player,
            difficulty,
            outcome: Outcome::InProgress,
        }
    }

    /// Reassembles a session from persisted parts.
    pub(crate) fn restore(
        player_id: String,
        player_name: Option<String>,
        board: Board,
        whose_turn: Turn,
        difficulty: Difficulty,
        outcome: Outcome,
    ) -> Self {
        Self {
            player_id,
            player_name,
            board,
            whose_turn,
            difficulty,
            outcome,
        }
    }

    /// Owning player identity.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Last display name seen for the player.
    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn whose_turn(&self) -> Turn {
        self.whose_turn
    }

    /// Opponent difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Current outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// True once the game has been won or drawn.
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Records the player's current display name.
    pub fn set_player_name(&mut self, name: Option<String>) {
        if name.is_some() {
            self.player_name = name;
        }
    }

    /// Changes the opponent difficulty. Allowed in any state.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        info!(from = ?self.difficulty, to = ?difficulty, "Difficulty changed");
        self.difficulty = difficulty;
    }

    /// Starts a new game, keeping player identity and difficulty.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn reset(&mut self) {
        info!(difficulty = ?self.difficulty, "Session reset");
        self.board = Board::new();
        self.whose_turn = Turn::Player;
        self.outcome = Outcome::InProgress;
    }

    /// Applies a move for `mover` at `cell` and returns the new outcome.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameAlreadyOver`] if the session is terminal.
    /// - [`GameError::OutOfTurn`] if `mover` is not the side to move.
    /// - [`GameError::InvalidMove`] if the cell is out of range or taken.
    ///
    /// On error nothing is modified.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub fn apply(&mut self, mover: Turn, cell: usize) -> Result<Outcome, GameError> {
        if self.is_terminal() {
            warn!(outcome = ?self.outcome, "Move on finished game");
            return Err(GameError::GameAlreadyOver);
        }
        if mover != self.whose_turn {
            warn!(expected = ?self.whose_turn, "Move out of turn");
            return Err(GameError::OutOfTurn);
        }

        let mark = mover.mark();
        self.board.place_mark(cell, mark)?;

        self.outcome = if self.board.check_winner(mark) {
            match mover {
                Turn::Player => Outcome::PlayerWin,
                Turn::Opponent => Outcome::OpponentWin,
            }
        } else if self.board.is_full() {
            Outcome::Draw
        } else {
            self.whose_turn = mover.other();
            Outcome::InProgress
        };

        debug!(outcome = ?self.outcome, next = ?self.whose_turn, "Move applied");
        Ok(self.outcome)
    }
}
