//! Ledger repository: recording games and querying standings.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::db::models::NewLedgerEntry;
use crate::db::snapshot::{LedgerSnapshot, SnapshotUser};
use crate::db::{
    DbError, GameReport, LeaderboardQuery, LedgerEntry, Participant, PlayerAggregate, SortKey,
    UserStats, establish, schema,
};
use crate::games::tictactoe::Difficulty;

/// Number of entries in a stats bundle's recent list.
const RECENT_GAMES: usize = 5;

/// SQLite-backed ledger.
///
/// Clones share one connection. Every operation takes the connection lock,
/// so updates to the same aggregate never interleave.
#[derive(Clone)]
pub struct LedgerRepository {
    db_path: String,
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for LedgerRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerRepository")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl LedgerRepository {
    /// Opens (creating if needed) the ledger at `db_path`.
    ///
    /// Use `":memory:"` for an in-memory ledger (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, DbError> {
        let db_path = db_path.as_ref().to_string();
        info!(path = %db_path, "Opening ledger");
        let conn = establish(&db_path)?;
        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a fresh in-memory ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if migrations fail.
    pub fn in_memory() -> Result<Self, DbError> {
        Self::open(":memory:")
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut SqliteConnection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }

    /// Appends a finished game and updates both participants' aggregates.
    ///
    /// The insert and both aggregate writes share one transaction: either
    /// all of them land or none do.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if both sides share an id, the winner is not a
    /// participant, or a database error occurs.
    #[instrument(
        skip(self, report),
        fields(
            player_one = %report.player_one().id(),
            player_two = %report.player_two().id(),
            winner = ?report.winner_id(),
        )
    )]
    pub fn record_game(&self, report: GameReport) -> Result<LedgerEntry, DbError> {
        let one_id = report.player_one().id();
        let two_id = report.player_two().id();
        if one_id == two_id {
            return Err(DbError::new(format!(
                "A game needs two distinct participants, got '{}' twice",
                one_id
            )));
        }
        if let Some(winner) = report.winner_id() {
            if winner != one_id && winner != two_id {
                return Err(DbError::new(format!(
                    "Winner '{}' did not take part in the game",
                    winner
                )));
            }
        }

        debug!("Recording game result");
        let entry = self.with_conn(|conn| {
            conn.transaction::<_, DbError, _>(|conn| {
                let mut one = load_or_create(conn, report.player_one())?;
                let mut two = load_or_create(conn, report.player_two())?;

                let entry = diesel::insert_into(schema::game_records::table)
                    .values(&NewLedgerEntry::from(&report))
                    .returning(LedgerEntry::as_returning())
                    .get_result(conn)?;

                one.apply_entry(&entry);
                two.apply_entry(&entry);
                for aggregate in [&one, &two] {
                    diesel::replace_into(schema::players::table)
                        .values(aggregate)
                        .execute(conn)?;
                }
                Ok(entry)
            })
        })?;

        info!(
            entry_id = entry.id(),
            game_type = %entry.game_type(),
            difficulty = ?entry.difficulty(),
            "Game result recorded"
        );
        Ok(entry)
    }

    /// Gets one player's aggregate. Returns `None` if never recorded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_player(&self, player_id: &str) -> Result<Option<PlayerAggregate>, DbError> {
        self.with_conn(|conn| find_player(conn, player_id))
    }

    /// Lists every aggregate, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_players(&self) -> Result<Vec<PlayerAggregate>, DbError> {
        self.with_conn(|conn| {
            Ok(schema::players::table
                .order(schema::players::id.asc())
                .select(PlayerAggregate::as_select())
                .load(conn)?)
        })
    }

    /// Lists every ledger entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, DbError> {
        self.with_conn(|conn| {
            Ok(schema::game_records::table
                .order(schema::game_records::id.asc())
                .select(LedgerEntry::as_select())
                .load(conn)?)
        })
    }

    /// Ranks players.
    ///
    /// With a game type or difficulty filter, only identities appearing in
    /// at least one matching entry are ranked. Sorting is descending on the
    /// chosen key, ties broken by ascending id, then truncated to the limit.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, query: &LeaderboardQuery) -> Result<Vec<PlayerAggregate>, DbError> {
        let mut players = self.with_conn(|conn| {
            let mut players: Vec<PlayerAggregate> = schema::players::table
                .select(PlayerAggregate::as_select())
                .load(conn)?;

            if query.game_type().is_some() || query.difficulty().is_some() {
                let mut matching = schema::game_records::table
                    .select((
                        schema::game_records::player_one_id,
                        schema::game_records::player_two_id,
                    ))
                    .into_boxed();
                if let Some(game_type) = query.game_type() {
                    matching = matching.filter(schema::game_records::game_type.eq(game_type.clone()));
                }
                if let Some(difficulty) = query.difficulty() {
                    matching = matching
                        .filter(schema::game_records::difficulty.eq(difficulty.to_string()));
                }
                let pairs: Vec<(String, String)> = matching.load(conn)?;
                let ids: HashSet<String> = pairs.into_iter().flat_map(|(a, b)| [a, b]).collect();
                players.retain(|p| ids.contains(p.id()));
            }
            Ok(players)
        })?;

        if *query.filter_bots() {
            players.retain(|p| !*p.is_bot());
        }

        rank(&mut players, *query.sort());
        players.truncate(*query.limit());

        info!(count = players.len(), sort = %query.sort(), "Leaderboard computed");
        Ok(players)
    }

    /// Gets a player's aggregate, matching entries and most recent games.
    ///
    /// Returns `None` if the identity has never been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn user_stats(
        &self,
        player_id: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Option<UserStats>, DbError> {
        let found = self.with_conn(|conn| {
            let Some(aggregate) = find_player(conn, player_id)? else {
                return Ok(None);
            };
            let games: Vec<LedgerEntry> = schema::game_records::table
                .filter(
                    schema::game_records::player_one_id
                        .eq(player_id)
                        .or(schema::game_records::player_two_id.eq(player_id)),
                )
                .order(schema::game_records::id.asc())
                .select(LedgerEntry::as_select())
                .load(conn)?;
            Ok(Some((aggregate, games)))
        })?;

        let Some((aggregate, mut games)) = found else {
            debug!("No aggregate for player");
            return Ok(None);
        };

        if let Some(difficulty) = difficulty {
            games.retain(|g| g.difficulty() == Some(difficulty));
        }

        let mut recent = games.clone();
        recent.sort_by(|a, b| {
            b.played_at()
                .cmp(a.played_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        recent.truncate(RECENT_GAMES);

        info!(games = games.len(), "User stats loaded");
        Ok(Some(UserStats::new(aggregate, games, recent)))
    }

    /// Recomputes every aggregate's counters from the entries.
    ///
    /// Names and bot flags are kept. Identities that appear in entries but
    /// have no aggregate get one. Returns the number of aggregates written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn rebuild_aggregates(&self) -> Result<usize, DbError> {
        let written = self.with_conn(|conn| {
            conn.transaction::<_, DbError, _>(|conn| {
                let mut players: BTreeMap<String, PlayerAggregate> = schema::players::table
                    .select(PlayerAggregate::as_select())
                    .load(conn)?
                    .into_iter()
                    .map(|p| (p.id().clone(), p))
                    .collect();
                for player in players.values_mut() {
                    player.reset_counters();
                }

                let entries: Vec<LedgerEntry> = schema::game_records::table
                    .order(schema::game_records::id.asc())
                    .select(LedgerEntry::as_select())
                    .load(conn)?;
                for entry in &entries {
                    for id in [entry.player_one_id(), entry.player_two_id()] {
                        players
                            .entry(id.clone())
                            .or_insert_with(|| {
                                warn!(player_id = %id, "Entry references unknown player");
                                PlayerAggregate::empty(id.clone())
                            })
                            .apply_entry(entry);
                    }
                }

                for player in players.values() {
                    diesel::replace_into(schema::players::table)
                        .values(player)
                        .execute(conn)?;
                }
                Ok(players.len())
            })
        })?;

        info!(players = written, "Aggregates rebuilt");
        Ok(written)
    }

    /// Dumps the whole ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn export_snapshot(&self) -> Result<LedgerSnapshot, DbError> {
        let players = self.list_players()?;
        let entries = self.entries()?;
        let snapshot = LedgerSnapshot::from_parts(&players, &entries);
        info!(
            users = snapshot.users.len(),
            games = snapshot.games.len(),
            "Ledger exported"
        );
        Ok(snapshot)
    }

    /// Replaces the whole ledger with `snapshot` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the snapshot holds an unreadable timestamp
    /// or a database error occurs. Nothing changes on error.
    #[instrument(skip(self, snapshot), fields(users = snapshot.users.len(), games = snapshot.games.len()))]
    pub fn import_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<(), DbError> {
        let players = snapshot
            .users
            .iter()
            .map(|(id, user)| SnapshotUser::to_aggregate(id, user))
            .collect::<Result<Vec<_>, _>>()?;
        let entries = snapshot
            .games
            .iter()
            .map(|game| game.to_entry())
            .collect::<Result<Vec<_>, _>>()?;

        self.with_conn(|conn| {
            conn.transaction::<_, DbError, _>(|conn| {
                diesel::delete(schema::game_records::table).execute(conn)?;
                diesel::delete(schema::players::table).execute(conn)?;
                for player in &players {
                    diesel::insert_into(schema::players::table)
                        .values(player)
                        .execute(conn)?;
                }
                for entry in &entries {
                    diesel::insert_into(schema::game_records::table)
                        .values(entry)
                        .execute(conn)?;
                }
                Ok(())
            })
        })?;

        info!("Ledger imported");
        Ok(())
    }
}

fn find_player(
    conn: &mut SqliteConnection,
    player_id: &str,
) -> Result<Option<PlayerAggregate>, DbError> {
    Ok(schema::players::table
        .find(player_id)
        .select(PlayerAggregate::as_select())
        .first(conn)
        .optional()?)
}

fn load_or_create(
    conn: &mut SqliteConnection,
    participant: &Participant,
) -> Result<PlayerAggregate, DbError> {
    let mut aggregate = match find_player(conn, participant.id())? {
        Some(existing) => existing,
        None => {
            debug!(player_id = %participant.id(), "Creating aggregate");
            PlayerAggregate::empty(participant.id().clone())
        }
    };
    aggregate.refresh_identity(participant);
    Ok(aggregate)
}

/// Sorts descending on `key`, ties broken by ascending id.
fn rank(players: &mut [PlayerAggregate], key: SortKey) {
    players.sort_by(|a, b| {
        let primary = match key {
            SortKey::Points => b.points().cmp(a.points()),
            SortKey::Wins => b.wins().cmp(a.wins()),
            SortKey::WinRate => b.win_rate().total_cmp(&a.win_rate()),
        };
        primary.then_with(|| a.id().cmp(b.id()))
    });
}
