//! One JSON file per player.

use super::{SessionRecord, SessionStore, StoreError};
use crate::games::tictactoe::Session;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Stores each session at `<dir>/tictactoe_<player_id>.json`.
///
/// Writes go to a temporary file that is then renamed over the record, so
/// a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        info!("Creating JSON file session store");
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File that holds `player_id`'s record.
    ///
    /// ASCII letters, digits and `-` are kept as is. Every other byte,
    /// `_` included, becomes `_xx` in lowercase hex, so distinct identities
    /// never share a file and none can escape the directory.
    pub fn path_for(&self, player_id: &str) -> PathBuf {
        let mut safe = String::with_capacity(player_id.len());
        for byte in player_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                safe.push(char::from(byte));
            } else {
                safe.push_str(&format!("_{:02x}", byte));
            }
        }
        self.dir.join(format!("tictactoe_{}.json", safe))
    }
}

impl SessionStore for JsonFileSessionStore {
    #[instrument(skip(self))]
    fn load(&self, player_id: &str) -> Result<Session, StoreError> {
        let path = self.path_for(player_id);
        debug!(path = %path.display(), "Loading session file");
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(player_id.to_string()));
            }
            Err(e) => {
                return Err(StoreError::io(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        SessionRecord::from_json(player_id, &text)
    }

    #[instrument(skip(self, session), fields(player_id = %session.player_id()))]
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            StoreError::io(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(session.player_id());
        let tmp = path.with_extension("json.tmp");
        let json = SessionRecord::to_json(session)?;

        std::fs::write(&tmp, json)
            .map_err(|e| StoreError::io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            StoreError::io(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete(&self, player_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(player_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
