//! Command-line interface for strictly_tictactoe_bot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strictly_tictactoe_bot::{Difficulty, LeaderboardQuery, Position, SortKey};

/// Strictly Tic-Tac-Toe Bot - play against Ye Olde Bot from the terminal
#[derive(Parser, Debug)]
#[command(name = "strictly_tictactoe_bot")]
#[command(about = "Single-player tic-tac-toe with a persistent hall of fame", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "tictactoe.toml", global = true)]
    pub config: PathBuf,

    /// Override the ledger database path
    #[arg(long, global = true)]
    pub ledger: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play interactively
    Play {
        /// Player identity
        #[arg(long, default_value = "local-player")]
        player: String,

        /// Display name recorded in the ledger
        #[arg(long)]
        name: Option<String>,

        /// Switch to this difficulty before playing
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Show the hall of fame
    Leaderboard {
        /// Number of players to list
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Sort key (points, wins, winRate)
        #[arg(long, default_value = "points")]
        sort: SortKey,

        /// Only count games at this difficulty
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Only count games of this type
        #[arg(long)]
        game_type: Option<String>,

        /// Leave bot identities out
        #[arg(long)]
        no_bots: bool,
    },

    /// Show one player's record
    Stats {
        /// Player identity
        player: String,

        /// Only count games at this difficulty
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Write the ledger to a JSON snapshot
    Export {
        /// Destination file
        path: PathBuf,
    },

    /// Replace the ledger with a JSON snapshot
    Import {
        /// Source file
        path: PathBuf,
    },

    /// Recompute every player's totals from the recorded games
    Rebuild,
}

/// A line typed during `play`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayCommand {
    /// Begin a new game.
    Start,
    /// Place a mark (0-based cell).
    Move(usize),
    /// Show the current difficulty.
    ShowDifficulty,
    /// Change difficulty.
    SetDifficulty(Difficulty),
    /// Show the leaderboard.
    Leaderboard {
        /// Rows to show.
        limit: usize,
        /// Difficulty filter.
        difficulty: Option<Difficulty>,
    },
    /// Show own stats.
    Stats(Option<Difficulty>),
    /// Show the board.
    Board,
    /// List commands.
    Help,
    /// Leave.
    Quit,
}

/// Help text for `play`.
pub const PLAY_HELP: &str = "\
Commands:
  start                              Begin a new game
  move <1-9|position>                Make thy move (e.g. 'move 5' or 'move center')
  board                              Show the field of battle
  difficulty                         View current difficulty
  difficulty <easy|medium|hard>      Change game difficulty
  leaderboard [limit] [difficulty]   View the hall of fame
  stats [difficulty]                 View thy battle statistics
  help                               Show this help
  quit                               Leave the field";

/// Parses one interactive line. A bare number or position label is a move.
pub fn parse_play_command(line: &str) -> Result<PlayCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("Say something, noble player. Type 'help' for commands.".to_string());
    };
    let rest: Vec<&str> = words.collect();

    match head.to_ascii_lowercase().as_str() {
        "start" | "new" => Ok(PlayCommand::Start),
        "move" => {
            let target = rest.join(" ");
            parse_cell(&target).map(PlayCommand::Move)
        }
        "board" => Ok(PlayCommand::Board),
        "difficulty" => match rest.first() {
            None => Ok(PlayCommand::ShowDifficulty),
            Some(level) => parse_difficulty(level).map(PlayCommand::SetDifficulty),
        },
        "leaderboard" => {
            let mut limit = 10;
            let mut difficulty = None;
            for word in rest {
                if let Ok(n) = word.parse::<usize>() {
                    limit = n.clamp(1, 25);
                } else {
                    difficulty = Some(parse_difficulty(word)?);
                }
            }
            Ok(PlayCommand::Leaderboard { limit, difficulty })
        }
        "stats" => match rest.first() {
            None => Ok(PlayCommand::Stats(None)),
            Some(level) => parse_difficulty(level).map(|d| PlayCommand::Stats(Some(d))),
        },
        "help" | "?" => Ok(PlayCommand::Help),
        "quit" | "exit" => Ok(PlayCommand::Quit),
        _ => parse_cell(line.trim())
            .map(PlayCommand::Move)
            .map_err(|_| format!("Unknown command '{}'. Type 'help' for commands.", head)),
    }
}

fn parse_cell(input: &str) -> Result<usize, String> {
    Position::from_user_input(input)
        .map(Position::to_index)
        .ok_or_else(|| "Invalid move! Thou must choose a number between 1 and 9.".to_string())
}

fn parse_difficulty(input: &str) -> Result<Difficulty, String> {
    input
        .parse()
        .map_err(|_| "Invalid difficulty! Choose from: easy, medium, hard".to_string())
}

/// Query behind the in-game `leaderboard` command, always scoped to `game_type`.
pub fn play_leaderboard_query(
    limit: usize,
    difficulty: Option<Difficulty>,
    game_type: &str,
) -> LeaderboardQuery {
    let query = LeaderboardQuery::default()
        .with_limit(limit)
        .with_game_type(game_type.to_string());
    match difficulty {
        Some(d) => query.with_difficulty(d),
        None => query,
    }
}
