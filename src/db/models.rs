//! Ledger models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use derive_setters::Setters;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::schema;
use crate::games::tictactoe::Difficulty;

/// Points for a win.
pub const WIN_POINTS: i32 = 3;
/// Points for a draw.
pub const DRAW_POINTS: i32 = 1;

/// One side of a recorded game.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct Participant {
    /// Stable identity.
    id: String,
    /// Display name; when present it replaces the stored one.
    display_name: Option<String>,
    /// Whether this identity is an engine-controlled opponent.
    is_bot: bool,
}

/// A finished game to append to the ledger.
#[derive(Debug, Clone, new, Getters)]
pub struct GameReport {
    player_one: Participant,
    player_two: Participant,
    /// `None` for a draw.
    winner_id: Option<String>,
    game_type: String,
    difficulty: Option<Difficulty>,
    played_at: NaiveDateTime,
}

/// Immutable ledger entry. Ids increase in insertion order.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::game_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct LedgerEntry {
    id: i32,
    player_one_id: String,
    player_two_id: String,
    winner_id: Option<String>,
    game_type: String,
    #[getter(skip)]
    difficulty: Option<String>,
    played_at: NaiveDateTime,
}

impl LedgerEntry {
    pub(crate) fn from_parts(
        id: i32,
        player_one_id: String,
        player_two_id: String,
        winner_id: Option<String>,
        game_type: String,
        difficulty: Option<String>,
        played_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            player_one_id,
            player_two_id,
            winner_id,
            game_type,
            difficulty,
            played_at,
        }
    }

    /// Difficulty the game was played at, if recorded and recognised.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty.as_deref().and_then(|d| d.parse().ok())
    }

    /// Raw stored difficulty tag.
    pub fn difficulty_tag(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    /// True if `player_id` took part.
    pub fn involves(&self, player_id: &str) -> bool {
        self.player_one_id == player_id || self.player_two_id == player_id
    }

    /// The other participant, if `player_id` took part.
    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if self.player_one_id == player_id {
            Some(&self.player_two_id)
        } else if self.player_two_id == player_id {
            Some(&self.player_one_id)
        } else {
            None
        }
    }

    /// Result from `player_id`'s point of view.
    pub fn outcome_for(&self, player_id: &str) -> Option<GameOutcome> {
        if !self.involves(player_id) {
            return None;
        }
        Some(match self.winner_id.as_deref() {
            None => GameOutcome::Draw,
            Some(winner) if winner == player_id => GameOutcome::Win,
            Some(_) => GameOutcome::Loss,
        })
    }
}

/// Insertable ledger entry; the database assigns the id.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::game_records)]
#[diesel(treat_none_as_default_value = false)]
pub(crate) struct NewLedgerEntry {
    player_one_id: String,
    player_two_id: String,
    winner_id: Option<String>,
    game_type: String,
    difficulty: Option<String>,
    played_at: NaiveDateTime,
}

impl From<&GameReport> for NewLedgerEntry {
    fn from(report: &GameReport) -> Self {
        Self {
            player_one_id: report.player_one().id().clone(),
            player_two_id: report.player_two().id().clone(),
            winner_id: report.winner_id().clone(),
            game_type: report.game_type().clone(),
            difficulty: report.difficulty().as_ref().map(Difficulty::to_string),
            played_at: *report.played_at(),
        }
    }
}

/// Game outcome from one participant's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// The participant won.
    Win,
    /// The participant lost.
    Loss,
    /// Game ended in a draw.
    Draw,
}

/// Cumulative statistics for one identity.
///
/// The counters are always the fold of [`PlayerAggregate::apply_entry`]
/// over every ledger entry that mentions the identity.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::players)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct PlayerAggregate {
    id: String,
    display_name: Option<String>,
    is_bot: bool,
    wins: i32,
    losses: i32,
    draws: i32,
    games_played: i32,
    points: i32,
    last_played: Option<NaiveDateTime>,
}

impl PlayerAggregate {
    /// A fresh aggregate with zeroed counters.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            is_bot: false,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
            points: 0,
            last_played: None,
        }
    }

    pub(crate) fn with_identity(mut self, display_name: Option<String>, is_bot: bool) -> Self {
        self.display_name = display_name;
        self.is_bot = is_bot;
        self
    }

    pub(crate) fn with_counters(
        mut self,
        wins: i32,
        losses: i32,
        draws: i32,
        games_played: i32,
        points: i32,
        last_played: Option<NaiveDateTime>,
    ) -> Self {
        self.wins = wins;
        self.losses = losses;
        self.draws = draws;
        self.games_played = games_played;
        self.points = points;
        self.last_played = last_played;
        self
    }

    /// Name to show: the display name, or the id when none is known.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Wins divided by games played; 0 before the first game.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }

    /// Takes the participant's latest name (if given) and bot flag.
    pub(crate) fn refresh_identity(&mut self, participant: &Participant) {
        if let Some(name) = participant.display_name() {
            self.display_name = Some(name.clone());
        }
        self.is_bot = *participant.is_bot();
    }

    /// Zeroes every counter, keeping identity fields.
    pub(crate) fn reset_counters(&mut self) {
        self.wins = 0;
        self.losses = 0;
        self.draws = 0;
        self.games_played = 0;
        self.points = 0;
        self.last_played = None;
    }

    /// Folds one ledger entry into the counters. Entries that do not
    /// mention this identity are ignored.
    #[instrument(skip(self, entry), fields(player_id = %self.id, entry_id = entry.id))]
    pub fn apply_entry(&mut self, entry: &LedgerEntry) {
        let Some(outcome) = entry.outcome_for(&self.id) else {
            return;
        };
        self.games_played += 1;
        match outcome {
            GameOutcome::Win => {
                self.wins += 1;
                self.points += WIN_POINTS;
            }
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => {
                self.draws += 1;
                self.points += DRAW_POINTS;
            }
        }
        self.last_played = Some(entry.played_at);
    }
}

/// Leaderboard ordering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SortKey {
    /// Total points, descending.
    #[default]
    Points,
    /// Total wins, descending.
    Wins,
    /// Wins per game played, descending.
    WinRate,
}

/// Leaderboard filters and limits.
///
/// Ties on the sort key are broken by ascending player id.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct LeaderboardQuery {
    limit: usize,
    sort: SortKey,
    filter_bots: bool,
    game_type: Option<String>,
    difficulty: Option<Difficulty>,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            sort: SortKey::default(),
            filter_bots: false,
            game_type: None,
            difficulty: None,
        }
    }
}

/// One player's statistics bundle.
#[derive(Debug, Clone, new, Getters)]
pub struct UserStats {
    /// Cumulative counters.
    aggregate: PlayerAggregate,
    /// Matching entries, oldest first.
    games: Vec<LedgerEntry>,
    /// Up to five matching entries, newest first.
    recent_games: Vec<LedgerEntry>,
}
