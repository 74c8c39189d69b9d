//! Bot configuration loaded from TOML.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::db::Participant;
use crate::games::tictactoe::Difficulty;
use crate::store::{
    JsonFileSessionStore, MemorySessionStore, SessionStore, SqliteSessionStore, StoreError,
};

/// Where sessions are kept.
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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SessionBackend {
    /// One JSON file per player.
    #[default]
    Json,
    /// A `sessions` table in SQLite.
    Sqlite,
    /// Process memory only.
    Memory,
}

/// Runtime configuration.
///
/// `with_*` setters override individual fields after loading.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
pub struct BotConfig {
    /// SQLite file holding the ledger.
    #[serde(default = "default_ledger_path")]
    ledger_path: String,

    /// Session storage backend.
    #[serde(default)]
    session_backend: SessionBackend,

    /// Directory for the `json` backend.
    #[serde(default = "default_sessions_dir")]
    sessions_dir: String,

    /// SQLite file for the `sqlite` backend.
    #[serde(default = "default_sessions_db")]
    sessions_db: String,

    /// Delay before the opponent replies, in milliseconds.
    #[serde(default = "default_thinking_delay_ms")]
    thinking_delay_ms: u64,

    /// Opponent identity in the ledger.
    #[serde(default = "default_bot_id")]
    bot_id: String,

    /// Opponent display name.
    #[serde(default = "default_bot_name")]
    bot_name: String,

    /// Game type tag for ledger entries.
    #[serde(default = "default_game_type")]
    game_type: String,

    /// Difficulty of freshly created sessions.
    #[serde(default)]
    default_difficulty: Difficulty,

    /// Fixed seed for reproducible Easy and Medium play.
    #[serde(default)]
    rng_seed: Option<u64>,
}

fn default_ledger_path() -> String {
    "data/tictactoe-ledger.db".to_string()
}

fn default_sessions_dir() -> String {
    "game_states".to_string()
}

fn default_sessions_db() -> String {
    "data/tictactoe-sessions.db".to_string()
}

fn default_thinking_delay_ms() -> u64 {
    1500
}

fn default_bot_id() -> String {
    "tictactoe-bot".to_string()
}

fn default_bot_name() -> String {
    "Ye Olde Bot".to_string()
}

fn default_game_type() -> String {
    "tictactoe".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            session_backend: SessionBackend::default(),
            sessions_dir: default_sessions_dir(),
            sessions_db: default_sessions_db(),
            thinking_delay_ms: default_thinking_delay_ms(),
            bot_id: default_bot_id(),
            bot_name: default_bot_name(),
            game_type: default_game_type(),
            default_difficulty: Difficulty::default(),
            rng_seed: None,
        }
    }
}

impl BotConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(
            backend = %config.session_backend,
            ledger = %config.ledger_path,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            warn!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Delay before the opponent replies.
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    /// The opponent as a ledger participant.
    pub fn opponent(&self) -> Participant {
        Participant::new(self.bot_id.clone(), Some(self.bot_name.clone()), true)
    }

    /// Opens the configured session store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the SQLite backend cannot be opened.
    #[instrument(skip(self), fields(backend = %self.session_backend))]
    pub fn open_session_store(&self) -> Result<Arc<dyn SessionStore>, StoreError> {
        let store: Arc<dyn SessionStore> = match self.session_backend {
            SessionBackend::Json => Arc::new(JsonFileSessionStore::new(&self.sessions_dir)),
            SessionBackend::Sqlite => {
                ensure_parent_dir(&self.sessions_db)?;
                Arc::new(SqliteSessionStore::open(&self.sessions_db)?)
            }
            SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        };
        Ok(store)
    }
}

/// Creates the directory a database file lives in.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be created.
pub fn ensure_parent_dir(file: &str) -> Result<(), StoreError> {
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
    Ok(())
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
