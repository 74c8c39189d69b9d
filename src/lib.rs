//! Strictly Tic-Tac-Toe Bot library - single-player tic-tac-toe engine
//!
//! A player faces an engine-controlled opponent at one of three difficulty
//! tiers. Sessions survive restarts and finished games feed a ledger of
//! per-player statistics.
//!
//! # Architecture
//!
//! - **Games**: board, rules, session state machine and opponent strategies
//! - **Store**: per-player session persistence (memory, JSON files, SQLite)
//! - **Ledger**: append-only results and derived aggregates (SQLite via diesel)
//! - **Orchestrator**: the two-step turn (player move, then opponent move)
//! - **Service**: async front door with delayed, cancellable opponent replies
//!
//! # Example
//!
//! ```no_run
//! use strictly_tictactoe_bot::{
//!     Difficulty, LedgerRepository, Orchestrator, Participant, Session, TurnOutcome,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let ledger = LedgerRepository::in_memory()?;
//! let bot = Participant::new("bot".to_string(), Some("Bot".to_string()), true);
//! let orchestrator = Orchestrator::with_seed(ledger, bot, "tictactoe", 7);
//!
//! let mut session = Session::new("alice", Difficulty::Hard);
//! let report = orchestrator.apply_player_move(&mut session, 4)?;
//! if *report.outcome() == TurnOutcome::OpponentToMove {
//!     orchestrator.apply_opponent_move(&mut session)?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod games;
mod orchestrator;
mod render;
mod service;
mod store;

// Crate-level exports - Configuration
pub use config::{BotConfig, ConfigError, SessionBackend, ensure_parent_dir};

// Crate-level exports - Ledger
pub use db::{
    DbError, GameOutcome, GameReport, LeaderboardQuery, LedgerEntry, LedgerRepository,
    LedgerSnapshot, Participant, PlayerAggregate, SnapshotGame, SnapshotStats, SnapshotUser,
    SortKey, UserStats, establish,
};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::rules::{
    LINES, check_winner, completing_move, has_three_in_a_row, is_draw, is_full,
};
pub use games::tictactoe::{
    Board, CELL_COUNT, Difficulty, GameError, GreedyStrategy, Mark, MixedStrategy,
    MoveStrategy, Outcome, Position, RandomStrategy, Session, Square, Turn,
};

// Crate-level exports - Turn sequencing
pub use orchestrator::{Orchestrator, TurnOutcome, TurnReport};

// Crate-level exports - Rendering
pub use render::{
    render_error, render_leaderboard, render_reply, render_session, render_stats, status_line,
};

// Crate-level exports - Service
pub use service::{GameEvent, GameService};

// Crate-level exports - Session storage
pub use store::{
    JsonFileSessionStore, MemorySessionStore, SessionRecord, SessionStore, SqliteSessionStore,
    StoreError,
};
