//! In-process session store.

use super::{SessionStore, StoreError};
use crate::games::tictactoe::Session;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// Keeps sessions in a map. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    #[instrument(skip(self))]
    fn load(&self, player_id: &str) -> Result<Session, StoreError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(player_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(player_id.to_string()))
    }

    #[instrument(skip(self, session), fields(player_id = %session.player_id()))]
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        debug!("Saving session in memory");
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.player_id().to_string(), session.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete(&self, player_id: &str) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(player_id);
        Ok(())
    }
}
