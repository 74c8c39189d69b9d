//! Session store error types.

use tracing::instrument;

/// Failure to load or save a session.
#[derive(Debug, Clone, derive_more::Display)]
pub enum StoreError {
    /// No session is stored for this player.
    #[display("No stored session for '{}'", _0)]
    NotFound(String),

    /// A stored session exists but cannot be used.
    ///
    /// Callers discard the record and start a fresh session.
    #[display("Stored session for '{player_id}' is corrupted: {reason}")]
    Corrupted {
        /// Owner of the broken record.
        player_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Reading or writing the backing storage failed.
    #[display("Session storage error: {message} at {file}:{line}")]
    Io {
        /// Error message.
        message: String,
        /// Source file where error occurred.
        file: &'static str,
        /// Line number where error occurred.
        line: u32,
    },
}

impl StoreError {
    /// Creates an I/O error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn io(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self::Io {
            message: message.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }

    /// Creates a corruption error for `player_id`.
    pub fn corrupted(player_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            player_id: player_id.into(),
            reason: reason.into(),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<crate::db::DbError> for StoreError {
    #[track_caller]
    fn from(err: crate::db::DbError) -> Self {
        Self::io(err.to_string())
    }
}
