//! On-disk layout of a session.
//!
//! The record keeps the field names of the legacy chat bot's
//! `tictactoe_<id>.json` files so existing saves load unchanged.

use super::StoreError;
use crate::games::tictactoe::{Board, CELL_COUNT, Difficulty, Mark, Outcome, Session, Turn};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Serialized form of a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    board: [Option<Mark>; CELL_COUNT],
    is_player_turn: bool,
    winner: Option<Mark>,
    game_over: bool,
    player_symbol: Mark,
    bot_symbol: Mark,
    /// Older records predate difficulty; they load as Medium.
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    player_name: Option<String>,
}

impl SessionRecord {
    /// Captures a session for storage.
    pub fn from_session(session: &Session) -> Self {
        let winner = match session.outcome() {
            Outcome::PlayerWin => Some(Session::PLAYER_MARK),
            Outcome::OpponentWin => Some(Session::OPPONENT_MARK),
            Outcome::InProgress | Outcome::Draw => None,
        };
        Self {
            board: session.board().to_marks(),
            is_player_turn: session.whose_turn() == Turn::Player,
            winner,
            game_over: session.is_terminal(),
            player_symbol: Session::PLAYER_MARK,
            bot_symbol: Session::OPPONENT_MARK,
            difficulty: Some(session.difficulty()),
            player_name: session.player_name().map(str::to_string),
        }
    }

    /// Validates the record and rebuilds the session it describes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if the symbols are not X/O, the
    /// mark counts break alternation, or the stored outcome contradicts
    /// the board.
    #[instrument(skip(self))]
    pub fn into_session(self, player_id: &str) -> Result<Session, StoreError> {
        if self.player_symbol != Session::PLAYER_MARK || self.bot_symbol != Session::OPPONENT_MARK
        {
            return Err(StoreError::corrupted(
                player_id,
                format!(
                    "unexpected symbols {} / {}",
                    self.player_symbol, self.bot_symbol
                ),
            ));
        }

        let board = Board::from_marks(self.board);
        if !board.is_consistent() {
            return Err(StoreError::corrupted(
                player_id,
                format!(
                    "mark counts X={} O={} break alternation",
                    board.count(Mark::X),
                    board.count(Mark::O)
                ),
            ));
        }

        let outcome = if self.game_over {
            let outcome = match self.winner {
                Some(Mark::X) => Outcome::PlayerWin,
                Some(Mark::O) => Outcome::OpponentWin,
                None => Outcome::Draw,
            };
            if outcome_from_board(&board) != Some(outcome) {
                return Err(StoreError::corrupted(
                    player_id,
                    format!("stored outcome {outcome:?} does not match the board"),
                ));
            }
            outcome
        } else if let Some(outcome) = outcome_from_board(&board) {
            warn!(player_id, ?outcome, "Record still open on a finished board");
            outcome
        } else {
            Outcome::InProgress
        };

        let whose_turn = if outcome.is_terminal() {
            if self.is_player_turn {
                Turn::Player
            } else {
                Turn::Opponent
            }
        } else if board.count(Mark::X) == board.count(Mark::O) {
            Turn::Player
        } else {
            Turn::Opponent
        };

        Ok(Session::restore(
            player_id.to_string(),
            self.player_name,
            board,
            whose_turn,
            self.difficulty.unwrap_or_default(),
            outcome,
        ))
    }

    /// Serializes a session to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if serialization fails.
    pub fn to_json(session: &Session) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&Self::from_session(session))
            .map_err(|e| StoreError::io(format!("Failed to serialize session: {}", e)))
    }

    /// Parses and validates stored JSON for `player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] on any parse or validation failure.
    pub fn from_json(player_id: &str, text: &str) -> Result<Session, StoreError> {
        let record: Self = serde_json::from_str(text)
            .map_err(|e| StoreError::corrupted(player_id, format!("invalid JSON: {}", e)))?;
        record.into_session(player_id)
    }
}

fn outcome_from_board(board: &Board) -> Option<Outcome> {
    if board.check_winner(Session::PLAYER_MARK) {
        Some(Outcome::PlayerWin)
    } else if board.check_winner(Session::OPPONENT_MARK) {
        Some(Outcome::OpponentWin)
    } else if board.is_full() {
        Some(Outcome::Draw)
    } else {
        None
    }
}
