//! Game ledger: append-only results plus per-player aggregates.

mod error;
mod models;
mod repository;
pub(crate) mod schema; // Diesel generated schema - internal use only
mod snapshot;

pub use error::DbError;
pub use models::{
    GameOutcome, GameReport, LeaderboardQuery, LedgerEntry, Participant, PlayerAggregate,
    SortKey, UserStats,
};
pub use repository::LedgerRepository;
pub use snapshot::{LedgerSnapshot, SnapshotGame, SnapshotStats, SnapshotUser};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Opens a SQLite connection and brings its schema up to date.
///
/// Use `":memory:"` for a throwaway database.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened or a migration fails.
#[instrument]
pub fn establish(db_path: &str) -> Result<SqliteConnection, DbError> {
    debug!("Establishing connection");
    let mut conn = SqliteConnection::establish(db_path)
        .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", db_path, e)))?;

    conn.batch_execute("PRAGMA busy_timeout = 5000;")?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::new(format!("Migrations failed on '{}': {}", db_path, e)))?;
    if !applied.is_empty() {
        info!(count = applied.len(), "Applied pending migrations");
    }

    Ok(conn)
}
