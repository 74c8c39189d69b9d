//! Whole-ledger snapshots in the legacy `tictactoe-leaderboard.json` layout.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::{DbError, LedgerEntry, PlayerAggregate};

/// The full ledger as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Aggregates keyed by player id.
    #[serde(default)]
    pub users: BTreeMap<String, SnapshotUser>,
    /// Entries in insertion order.
    #[serde(default)]
    pub games: Vec<SnapshotGame>,
}

/// One aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotUser {
    /// Player id; repeats the map key.
    pub user_id: String,
    /// Display name.
    #[serde(default)]
    pub username: Option<String>,
    /// Engine-controlled opponent flag.
    #[serde(default)]
    pub is_bot: bool,
    /// Counters.
    #[serde(default)]
    pub stats: SnapshotStats,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_played: Option<i64>,
}

/// Counters of one aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    /// Games won.
    #[serde(default)]
    pub wins: i32,
    /// Games lost.
    #[serde(default)]
    pub losses: i32,
    /// Games drawn.
    #[serde(default)]
    pub draws: i32,
    /// Games played.
    #[serde(default)]
    pub total_games: i32,
    /// Points.
    #[serde(default)]
    pub points: i32,
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotGame {
    /// Entry id.
    pub id: i32,
    /// First participant.
    pub player_one_id: String,
    /// Second participant.
    pub player_two_id: String,
    /// Winner; `null` for a draw.
    #[serde(default)]
    pub winner_id: Option<String>,
    /// Game type tag.
    pub game_type: String,
    /// Difficulty tag.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

fn to_millis(at: &NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

#[track_caller]
fn from_millis(ms: i64) -> Result<NaiveDateTime, DbError> {
    DateTime::from_timestamp_millis(ms)
        .map(|at| at.naive_utc())
        .ok_or_else(|| DbError::new(format!("Timestamp {} is out of range", ms)))
}

impl LedgerSnapshot {
    /// Builds a snapshot from stored aggregates and entries.
    pub fn from_parts(players: &[PlayerAggregate], entries: &[LedgerEntry]) -> Self {
        let users = players
            .iter()
            .map(|p| (p.id().clone(), SnapshotUser::from(p)))
            .collect();
        let games = entries.iter().map(SnapshotGame::from).collect();
        Self { users, games }
    }

    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::new(format!("Failed to read {}: {}", path.display(), e)))?;
        let snapshot: Self = serde_json::from_str(&text)
            .map_err(|e| DbError::new(format!("Failed to parse {}: {}", path.display(), e)))?;
        debug!(users = snapshot.users.len(), games = snapshot.games.len(), "Snapshot read");
        Ok(snapshot)
    }

    /// Writes the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the write fails.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DbError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DbError::new(format!("Failed to serialize snapshot: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::new(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, json)
            .map_err(|e| DbError::new(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Snapshot written");
        Ok(())
    }
}

impl From<&PlayerAggregate> for SnapshotUser {
    fn from(p: &PlayerAggregate) -> Self {
        Self {
            user_id: p.id().clone(),
            username: p.display_name().clone(),
            is_bot: *p.is_bot(),
            stats: SnapshotStats {
                wins: *p.wins(),
                losses: *p.losses(),
                draws: *p.draws(),
                total_games: *p.games_played(),
                points: *p.points(),
            },
            last_played: p.last_played().as_ref().map(to_millis),
        }
    }
}

impl SnapshotUser {
    /// Converts back to an aggregate stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if `last_played` is out of range.
    pub fn to_aggregate(id: &str, user: &SnapshotUser) -> Result<PlayerAggregate, DbError> {
        let last_played = user.last_played.map(from_millis).transpose()?;
        Ok(PlayerAggregate::empty(id)
            .with_identity(user.username.clone(), user.is_bot)
            .with_counters(
                user.stats.wins,
                user.stats.losses,
                user.stats.draws,
                user.stats.total_games,
                user.stats.points,
                last_played,
            ))
    }
}

impl From<&LedgerEntry> for SnapshotGame {
    fn from(e: &LedgerEntry) -> Self {
        Self {
            id: *e.id(),
            player_one_id: e.player_one_id().clone(),
            player_two_id: e.player_two_id().clone(),
            winner_id: e.winner_id().clone(),
            game_type: e.game_type().clone(),
            difficulty: e.difficulty_tag().map(str::to_string),
            timestamp: to_millis(e.played_at()),
        }
    }
}

impl SnapshotGame {
    /// Converts back to a ledger entry keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the timestamp is out of range.
    pub fn to_entry(&self) -> Result<LedgerEntry, DbError> {
        Ok(LedgerEntry::from_parts(
            self.id,
            self.player_one_id.clone(),
            self.player_two_id.clone(),
            self.winner_id.clone(),
            self.game_type.clone(),
            self.difficulty.clone(),
            from_millis(self.timestamp)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_leaderboard_file() {
        let text = r#"{
            "users": {
                "u1": {
                    "userId": "u1",
                    "username": "Alice",
                    "isBot": false,
                    "stats": { "wins": 2, "losses": 1, "draws": 0, "totalGames": 3, "points": 6 },
                    "lastPlayed": 1700000000000
                }
            },
            "games": [
                { "id": 1, "playerOneId": "u1", "playerTwoId": "bot", "winnerId": null,
                  "gameType": "tictactoe", "difficulty": "hard", "timestamp": 1700000000000 }
            ]
        }"#;
        let snapshot: LedgerSnapshot = serde_json::from_str(text).expect("parse");
        let user = &snapshot.users["u1"];
        assert_eq!(user.stats.total_games, 3);
        assert_eq!(user.last_played, Some(1_700_000_000_000));

        let entry = snapshot.games[0].to_entry().expect("entry");
        assert_eq!(entry.winner_id(), &None);
        assert_eq!(entry.difficulty(), Some(crate::games::tictactoe::Difficulty::Hard));
        assert_eq!(to_millis(entry.played_at()), 1_700_000_000_000);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot: LedgerSnapshot = serde_json::from_str("{}").expect("parse");
        assert!(snapshot.users.is_empty());
        assert!(snapshot.games.is_empty());
    }
}
