//! Strictly Tic-Tac-Toe Bot - terminal adapter
//!
//! Plays against the engine interactively and manages the ledger.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, PLAY_HELP, PlayCommand, parse_play_command, play_leaderboard_query};
use strictly_tictactoe_bot::{
    BotConfig, Difficulty, GameError, GameEvent, GameService, LeaderboardQuery, LedgerRepository,
    LedgerSnapshot, Orchestrator, SortKey, ensure_parent_dir, render_error, render_leaderboard,
    render_reply, render_session, render_stats,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = BotConfig::load_or_default(&cli.config)?;
    if let Some(path) = cli.ledger {
        config = config.with_ledger_path(path);
    }
    ensure_parent_dir(config.ledger_path())?;
    let ledger = LedgerRepository::open(config.ledger_path())?;

    match cli.command {
        Command::Play {
            player,
            name,
            difficulty,
        } => run_play(config, ledger, player, name, difficulty).await,
        Command::Leaderboard {
            limit,
            sort,
            difficulty,
            game_type,
            no_bots,
        } => {
            let mut query = LeaderboardQuery::default()
                .with_limit(limit)
                .with_sort(sort)
                .with_filter_bots(no_bots);
            if let Some(game_type) = game_type {
                query = query.with_game_type(game_type);
            }
            if let Some(difficulty) = difficulty {
                query = query.with_difficulty(difficulty);
            }
            let players = ledger.leaderboard(&query)?;
            println!("{}", render_leaderboard(&players, sort, difficulty));
            Ok(())
        }
        Command::Stats { player, difficulty } => {
            match ledger.user_stats(&player, difficulty)? {
                Some(stats) => println!("{}", render_stats(&stats)),
                None => println!("{}", render_error(&GameError::NotFound(player))),
            }
            Ok(())
        }
        Command::Export { path } => {
            ledger.export_snapshot()?.write_to(&path)?;
            info!(path = %path.display(), "Ledger exported");
            Ok(())
        }
        Command::Import { path } => {
            let snapshot = LedgerSnapshot::read_from(&path)?;
            ledger.import_snapshot(&snapshot)?;
            info!(path = %path.display(), "Ledger imported");
            Ok(())
        }
        Command::Rebuild => {
            let count = ledger.rebuild_aggregates()?;
            println!("Rebuilt totals for {} players.", count);
            Ok(())
        }
    }
}

/// Interactive game loop.
#[instrument(skip(config, ledger, name, difficulty))]
async fn run_play(
    config: BotConfig,
    ledger: LedgerRepository,
    player: String,
    name: Option<String>,
    difficulty: Option<Difficulty>,
) -> Result<()> {
    let store = config.open_session_store()?;
    let orchestrator = match config.rng_seed() {
        Some(seed) => Orchestrator::with_seed(ledger, config.opponent(), config.game_type(), *seed),
        None => Orchestrator::new(ledger, config.opponent(), config.game_type()),
    };
    let (service, mut events) = GameService::new(
        store,
        orchestrator,
        config.thinking_delay(),
        *config.default_difficulty(),
    );

    info!(%player, "Starting interactive play");
    let session = match difficulty {
        Some(d) => service.set_difficulty(&player, d).await?,
        None => service.session(&player).await?,
    };
    println!("{}\n", render_session(&session));
    println!("{}", PLAY_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_play_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };
                if command == PlayCommand::Quit {
                    println!("Fare thee well!");
                    break;
                }
                handle_command(&service, &player, name.clone(), config.game_type(), command).await;
            }
            Some(event) = events.recv() => match event {
                GameEvent::OpponentMoved { session, report, .. } => {
                    println!("{}\n", render_reply(*report.cell(), *report.outcome()));
                    println!("{}", render_session(&session));
                }
                GameEvent::ReplyFailed { error, .. } => println!("{}", render_error(&error)),
            },
        }
    }
    Ok(())
}

async fn handle_command(
    service: &GameService,
    player: &str,
    name: Option<String>,
    game_type: &str,
    command: PlayCommand,
) {
    let result = match command {
        PlayCommand::Start => service
            .new_game(player, name)
            .await
            .map(|s| render_session(&s)),
        PlayCommand::Move(cell) => service
            .make_move(player, name, cell)
            .await
            .map(|(s, _)| render_session(&s)),
        PlayCommand::Board => service.session(player).await.map(|s| render_session(&s)),
        PlayCommand::ShowDifficulty => service.session(player).await.map(|s| {
            format!(
                "Current difficulty: {} - {}",
                s.difficulty(),
                s.difficulty().description()
            )
        }),
        PlayCommand::SetDifficulty(d) => service
            .set_difficulty(player, d)
            .await
            .map(|_| format!("Thou hast chosen {}. {}", d, d.description())),
        PlayCommand::Leaderboard { limit, difficulty } => {
            let query = play_leaderboard_query(limit, difficulty, game_type);
            service
                .leaderboard(&query)
                .map(|players| render_leaderboard(&players, SortKey::Points, difficulty))
        }
        PlayCommand::Stats(difficulty) => service
            .user_stats(player, difficulty)
            .map(|stats| render_stats(&stats)),
        PlayCommand::Help => Ok(PLAY_HELP.to_string()),
        PlayCommand::Quit => Ok(String::new()),
    };
    match result {
        Ok(text) => println!("{}", text),
        Err(e) => println!("{}", render_error(&e)),
    }
}
