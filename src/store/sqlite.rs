//! Sessions kept in a SQLite table, one row per player.

use super::{SessionRecord, SessionStore, StoreError};
use crate::db::{establish, schema};
use crate::games::tictactoe::Session;
use diesel::prelude::*;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument};

/// Stores each session's JSON record in the `sessions` table.
///
/// The row holds the same document the file store writes, so records can
/// move between backends unchanged.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db_path: String,
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for SqliteSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSessionStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteSessionStore {
    /// Opens (creating if needed) the session database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_string();
        info!("Opening SQLite session store");
        let conn = establish(&db_path)?;
        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut SqliteConnection) -> QueryResult<T>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn).map_err(|e| StoreError::io(format!("Session query failed: {}", e)))
    }
}

impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    fn load(&self, player_id: &str) -> Result<Session, StoreError> {
        let state: Option<String> = self.with_conn(|conn| {
            schema::sessions::table
                .find(player_id)
                .select(schema::sessions::state)
                .first(conn)
                .optional()
        })?;
        let state = state.ok_or_else(|| StoreError::NotFound(player_id.to_string()))?;
        SessionRecord::from_json(player_id, &state)
    }

    #[instrument(skip(self, session), fields(player_id = %session.player_id()))]
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let state = SessionRecord::to_json(session)?;
        let now = chrono::Utc::now().naive_utc();
        self.with_conn(|conn| {
            diesel::replace_into(schema::sessions::table)
                .values((
                    schema::sessions::player_id.eq(session.player_id()),
                    schema::sessions::state.eq(&state),
                    schema::sessions::updated_at.eq(now),
                ))
                .execute(conn)
        })?;
        debug!("Session row written");
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete(&self, player_id: &str) -> Result<(), StoreError> {
        let removed = self.with_conn(|conn| {
            diesel::delete(schema::sessions::table.find(player_id)).execute(conn)
        })?;
        debug!(removed, "Session row removed");
        Ok(())
    }
}
