//! Turn sequencing: validate, apply, detect the end of the game, record it.
//!
//! A full turn is two separately invocable steps,
//! [`Orchestrator::apply_player_move`] and
//! [`Orchestrator::apply_opponent_move`], so callers can schedule a delay
//! between them. Both are synchronous.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use derive_getters::Getters;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, instrument};

use crate::db::{GameReport, LedgerEntry, LedgerRepository, Participant};
use crate::games::tictactoe::{GameError, Outcome, Session, Turn};

/// What the caller should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnOutcome {
    /// The opponent moves next; schedule [`Orchestrator::apply_opponent_move`].
    OpponentToMove,
    /// The player moves next.
    PlayerToMove,
    /// The player completed a line.
    PlayerWin,
    /// The opponent completed a line.
    OpponentWin,
    /// The board filled without a line.
    Draw,
}

impl TurnOutcome {
    /// True if the game ended on this step.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TurnOutcome::PlayerWin | TurnOutcome::OpponentWin | TurnOutcome::Draw
        )
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct TurnReport {
    /// Cell that was played (0-8).
    cell: usize,
    /// State after the move.
    outcome: TurnOutcome,
    /// Ledger entry, when the move ended the game and recording succeeded.
    entry: Option<LedgerEntry>,
}

/// Couples sessions, strategies and the ledger into playable turns.
#[derive(Debug)]
pub struct Orchestrator {
    ledger: LedgerRepository,
    opponent: Participant,
    game_type: String,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    /// Creates an orchestrator with an entropy-seeded random source.
    pub fn new(ledger: LedgerRepository, opponent: Participant, game_type: impl Into<String>) -> Self {
        Self::with_rng(ledger, opponent, game_type, StdRng::from_entropy())
    }

    /// Creates an orchestrator whose Easy and Medium play is reproducible.
    pub fn with_seed(
        ledger: LedgerRepository,
        opponent: Participant,
        game_type: impl Into<String>,
        seed: u64,
    ) -> Self {
        Self::with_rng(ledger, opponent, game_type, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        ledger: LedgerRepository,
        opponent: Participant,
        game_type: impl Into<String>,
        rng: StdRng,
    ) -> Self {
        let game_type = game_type.into();
        info!(opponent = %opponent.id(), %game_type, "Creating orchestrator");
        Self {
            ledger,
            opponent,
            game_type,
            rng: Mutex::new(rng),
        }
    }

    /// The ledger finished games are written to.
    pub fn ledger(&self) -> &LedgerRepository {
        &self.ledger
    }

    /// The opponent's ledger identity.
    pub fn opponent(&self) -> &Participant {
        &self.opponent
    }

    /// Game type tag written with every entry.
    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    /// Plays the player's mark at `cell`.
    ///
    /// # Errors
    ///
    /// [`GameError::GameAlreadyOver`], [`GameError::OutOfTurn`] or
    /// [`GameError::InvalidMove`]; the session is unchanged on error.
    #[instrument(skip(self, session), fields(player_id = %session.player_id()))]
    pub fn apply_player_move(
        &self,
        session: &mut Session,
        cell: usize,
    ) -> Result<TurnReport, GameError> {
        let outcome = session.apply(Turn::Player, cell)?;
        Ok(self.finish_step(session, cell, outcome))
    }

    /// Lets the opponent pick and play a cell using the session's difficulty.
    ///
    /// # Errors
    ///
    /// [`GameError::GameAlreadyOver`] if the game ended,
    /// [`GameError::OutOfTurn`] if the player is to move. The session is
    /// unchanged on error.
    #[instrument(skip(self, session), fields(player_id = %session.player_id(), difficulty = %session.difficulty()))]
    pub fn apply_opponent_move(&self, session: &mut Session) -> Result<TurnReport, GameError> {
        if session.is_terminal() {
            return Err(GameError::GameAlreadyOver);
        }
        if session.whose_turn() != Turn::Opponent {
            return Err(GameError::OutOfTurn);
        }

        let strategy = session.difficulty().strategy();
        let cell = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            strategy.select_move(
                session.board(),
                Session::OPPONENT_MARK,
                Session::PLAYER_MARK,
                &mut *rng,
            )?
        };
        debug!(cell, strategy = strategy.name(), "Opponent chose cell");

        let outcome = session.apply(Turn::Opponent, cell)?;
        Ok(self.finish_step(session, cell, outcome))
    }

    fn finish_step(&self, session: &Session, cell: usize, outcome: Outcome) -> TurnReport {
        let outcome = match outcome {
            Outcome::InProgress => match session.whose_turn() {
                Turn::Opponent => TurnOutcome::OpponentToMove,
                Turn::Player => TurnOutcome::PlayerToMove,
            },
            Outcome::PlayerWin => TurnOutcome::PlayerWin,
            Outcome::OpponentWin => TurnOutcome::OpponentWin,
            Outcome::Draw => TurnOutcome::Draw,
        };
        let entry = if outcome.is_terminal() {
            self.record(session)
        } else {
            None
        };
        TurnReport {
            cell,
            outcome,
            entry,
        }
    }

    /// Writes the finished game to the ledger. Failures are logged; the
    /// move itself still stands.
    fn record(&self, session: &Session) -> Option<LedgerEntry> {
        let winner_id = match session.outcome() {
            Outcome::PlayerWin => Some(session.player_id().to_string()),
            Outcome::OpponentWin => Some(self.opponent.id().clone()),
            Outcome::Draw | Outcome::InProgress => None,
        };
        let player = Participant::new(
            session.player_id().to_string(),
            session.player_name().map(str::to_string),
            false,
        );
        let report = GameReport::new(
            player,
            self.opponent.clone(),
            winner_id,
            self.game_type.clone(),
            Some(session.difficulty()),
            Utc::now().naive_utc(),
        );
        match self.ledger.record_game(report) {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!(error = %e, player_id = %session.player_id(), "Failed to record game");
                None
            }
        }
    }
}
