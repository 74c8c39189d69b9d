//! Durable per-player session storage.
//!
//! One record per player identity. Concurrent writes for one identity are
//! not expected; if they happen the last write wins.

mod error;
mod json_file;
mod memory;
mod record;
mod sqlite;

pub use error::StoreError;
pub use json_file::JsonFileSessionStore;
pub use memory::MemorySessionStore;
pub use record::SessionRecord;
pub use sqlite::SqliteSessionStore;

use crate::games::tictactoe::Session;

/// Storage for one session per player identity.
///
/// Implementations fail fast: an error is returned rather than retried.
pub trait SessionStore: std::fmt::Debug + Send + Sync {
    /// Loads the session stored for `player_id`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if nothing is stored.
    /// - [`StoreError::Corrupted`] if the record exists but is unusable.
    /// - [`StoreError::Io`] if the storage cannot be read.
    fn load(&self, player_id: &str) -> Result<Session, StoreError>;

    /// Stores `session` under its player identity, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Removes the record for `player_id`. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the removal fails.
    fn delete(&self, player_id: &str) -> Result<(), StoreError>;
}
