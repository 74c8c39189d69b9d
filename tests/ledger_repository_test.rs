//! Tests for ledger recording, ranking, stats and snapshots.

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

use strictly_tictactoe_bot::{
    Difficulty, GameReport, LeaderboardQuery, LedgerRepository, LedgerSnapshot, Participant,
    SortKey,
};

const BOT: &str = "bot";

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid timestamp")
}

fn human(id: &str) -> Participant {
    Participant::new(id.to_string(), None, false)
}

fn bot() -> Participant {
    Participant::new(BOT.to_string(), Some("Ye Olde Bot".to_string()), true)
}

/// Records `player` against the bot; `winner` is `Some(true)` for a
/// player win, `Some(false)` for a bot win, `None` for a draw.
fn record(
    ledger: &LedgerRepository,
    player: &str,
    winner: Option<bool>,
    difficulty: Difficulty,
    played_at: NaiveDateTime,
) {
    let winner_id = winner.map(|player_won| {
        if player_won {
            player.to_string()
        } else {
            BOT.to_string()
        }
    });
    ledger
        .record_game(GameReport::new(
            human(player),
            bot(),
            winner_id,
            "tictactoe".to_string(),
            Some(difficulty),
            played_at,
        ))
        .expect("Record failed");
}

fn setup() -> LedgerRepository {
    LedgerRepository::in_memory().expect("Failed to open ledger")
}

#[test]
fn test_decisive_game_credits_winner_and_loser() {
    let ledger = setup();
    record(&ledger, "alice", Some(true), Difficulty::Hard, at(1, 10));

    let alice = ledger.get_player("alice").expect("Query failed").expect("Recorded");
    assert_eq!(*alice.wins(), 1);
    assert_eq!(*alice.losses(), 0);
    assert_eq!(*alice.points(), 3);
    assert_eq!(*alice.games_played(), 1);
    assert_eq!(*alice.last_played(), Some(at(1, 10)));

    let bot = ledger.get_player(BOT).expect("Query failed").expect("Recorded");
    assert_eq!(*bot.wins(), 0);
    assert_eq!(*bot.losses(), 1);
    assert_eq!(*bot.points(), 0);
    assert_eq!(*bot.games_played(), 1);
}

#[test]
fn test_draw_credits_both() {
    let ledger = setup();
    record(&ledger, "alice", None, Difficulty::Medium, at(1, 10));

    for id in ["alice", BOT] {
        let player = ledger.get_player(id).expect("Query failed").expect("Recorded");
        assert_eq!(*player.draws(), 1);
        assert_eq!(*player.points(), 1);
        assert_eq!(*player.games_played(), 1);
    }
}

#[test]
fn test_entry_ids_follow_insertion_order() {
    let ledger = setup();
    record(&ledger, "alice", None, Difficulty::Easy, at(2, 10));
    record(&ledger, "bob", Some(false), Difficulty::Easy, at(1, 10));

    let entries = ledger.entries().expect("Query failed");
    assert_eq!(entries.len(), 2);
    assert!(entries[0].id() < entries[1].id());
    assert_eq!(entries[0].player_one_id(), "alice");
}

#[test]
fn test_display_name_is_overwritten_only_when_given() {
    let ledger = setup();
    let named = Participant::new("alice".to_string(), Some("Alice".to_string()), false);
    ledger
        .record_game(GameReport::new(
            named,
            bot(),
            None,
            "tictactoe".to_string(),
            None,
            at(1, 10),
        ))
        .expect("Record failed");
    record(&ledger, "alice", None, Difficulty::Easy, at(1, 11));

    let alice = ledger.get_player("alice").expect("Query failed").expect("Recorded");
    assert_eq!(alice.display_name().as_deref(), Some("Alice"));
    assert_eq!(alice.label(), "Alice");
    assert_eq!(*alice.games_played(), 2);
}

#[test]
fn test_invalid_reports_are_rejected() {
    let ledger = setup();
    let same = ledger.record_game(GameReport::new(
        human("alice"),
        human("alice"),
        None,
        "tictactoe".to_string(),
        None,
        at(1, 10),
    ));
    assert!(same.is_err());

    let outsider = ledger.record_game(GameReport::new(
        human("alice"),
        bot(),
        Some("mallory".to_string()),
        "tictactoe".to_string(),
        None,
        at(1, 10),
    ));
    assert!(outsider.is_err());
    assert!(ledger.entries().expect("Query failed").is_empty());
    assert!(ledger.list_players().expect("Query failed").is_empty());
}

#[test]
fn test_leaderboard_win_rate_ranks_higher_ratio_first() {
    let ledger = setup();
    for i in 0..10 {
        record(&ledger, "alice", Some(i < 3), Difficulty::Hard, at(1, i));
    }
    for i in 0..4 {
        record(&ledger, "bob", Some(i < 2), Difficulty::Hard, at(2, i));
    }

    let query = LeaderboardQuery::default()
        .with_sort(SortKey::WinRate)
        .with_filter_bots(true);
    let ranked = ledger.leaderboard(&query).expect("Query failed");
    let ids: Vec<&str> = ranked.iter().map(|p| p.id().as_str()).collect();
    assert_eq!(ids, vec!["bob", "alice"]);

    // By points alice (9) leads bob (6).
    let query = LeaderboardQuery::default().with_filter_bots(true);
    let ranked = ledger.leaderboard(&query).expect("Query failed");
    assert_eq!(ranked[0].id(), "alice");
}

#[test]
fn test_leaderboard_includes_bots_unless_filtered() {
    let ledger = setup();
    record(&ledger, "alice", Some(false), Difficulty::Hard, at(1, 1));

    let all = ledger.leaderboard(&LeaderboardQuery::default()).expect("Query failed");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id(), BOT);

    let humans = ledger
        .leaderboard(&LeaderboardQuery::default().with_filter_bots(true))
        .expect("Query failed");
    assert_eq!(humans.len(), 1);
}

#[test]
fn test_leaderboard_ties_break_by_id_and_respect_limit() {
    let ledger = setup();
    for id in ["carol", "alice", "bob"] {
        record(&ledger, id, Some(true), Difficulty::Easy, at(1, 1));
    }
    let query = LeaderboardQuery::default()
        .with_filter_bots(true)
        .with_limit(2);
    let ranked = ledger.leaderboard(&query).expect("Query failed");
    let ids: Vec<&str> = ranked.iter().map(|p| p.id().as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob"]);
}

#[test]
fn test_leaderboard_filters_by_difficulty_and_game_type() {
    let ledger = setup();
    record(&ledger, "alice", Some(true), Difficulty::Hard, at(1, 1));
    record(&ledger, "bob", Some(true), Difficulty::Easy, at(1, 2));

    let hard = ledger
        .leaderboard(
            &LeaderboardQuery::default()
                .with_difficulty(Difficulty::Hard)
                .with_filter_bots(true),
        )
        .expect("Query failed");
    assert_eq!(hard.len(), 1);
    assert_eq!(hard[0].id(), "alice");

    let other_game = ledger
        .leaderboard(&LeaderboardQuery::default().with_game_type("chess".to_string()))
        .expect("Query failed");
    assert!(other_game.is_empty());
}

#[test]
fn test_user_stats_recent_games_newest_first() {
    let ledger = setup();
    for day in 1..=7 {
        record(&ledger, "alice", Some(day % 2 == 0), Difficulty::Medium, at(day, 12));
    }
    record(&ledger, "alice", None, Difficulty::Hard, at(8, 12));

    let stats = ledger
        .user_stats("alice", None)
        .expect("Query failed")
        .expect("Alice has played");
    assert_eq!(stats.games().len(), 8);
    assert_eq!(stats.recent_games().len(), 5);
    let days: Vec<NaiveDateTime> = stats.recent_games().iter().map(|g| *g.played_at()).collect();
    assert_eq!(days, vec![at(8, 12), at(7, 12), at(6, 12), at(5, 12), at(4, 12)]);

    let medium = ledger
        .user_stats("alice", Some(Difficulty::Medium))
        .expect("Query failed")
        .expect("Alice has played");
    assert_eq!(medium.games().len(), 7);
    assert_eq!(*medium.recent_games()[0].played_at(), at(7, 12));
    assert_eq!(*medium.aggregate().games_played(), 8);
}

#[test]
fn test_user_stats_unknown_player_is_none() {
    let ledger = setup();
    assert!(ledger.user_stats("nobody", None).expect("Query failed").is_none());
}

#[test]
fn test_snapshot_round_trip_and_rebuild() {
    let source = setup();
    record(&source, "alice", Some(true), Difficulty::Hard, at(1, 1));
    record(&source, "alice", None, Difficulty::Easy, at(1, 2));
    record(&source, "bob", Some(false), Difficulty::Medium, at(1, 3));
    let snapshot = source.export_snapshot().expect("Export failed");
    assert_eq!(snapshot.users.len(), 3);
    assert_eq!(snapshot.games.len(), 3);
    assert_eq!(snapshot.users["alice"].stats.points, 4);

    let file = NamedTempFile::new().expect("Failed to create temp file");
    snapshot.write_to(file.path()).expect("Write failed");
    let mut read_back = LedgerSnapshot::read_from(file.path()).expect("Read failed");
    assert_eq!(read_back, snapshot);

    // Tamper with a total; rebuilding restores the fold over the entries.
    if let Some(alice) = read_back.users.get_mut("alice") {
        alice.stats.points = 99;
    }
    let target = setup();
    target.import_snapshot(&read_back).expect("Import failed");
    assert_eq!(
        *target.get_player("alice").expect("Query failed").expect("Imported").points(),
        99
    );
    assert_eq!(target.rebuild_aggregates().expect("Rebuild failed"), 3);
    assert_eq!(target.list_players().expect("Query failed"), source.list_players().expect("Query failed"));
    assert_eq!(target.entries().expect("Query failed"), source.entries().expect("Query failed"));

    // New entries continue after the imported ids.
    record(&target, "carol", None, Difficulty::Easy, at(2, 1));
    let entries = target.entries().expect("Query failed");
    assert!(entries[3].id() > entries[2].id());
}

#[test]
fn test_ledger_survives_reopen() {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let path = file.path().to_str().expect("Invalid path").to_string();
    {
        let ledger = LedgerRepository::open(&path).expect("Open failed");
        record(&ledger, "alice", Some(true), Difficulty::Hard, at(1, 1));
    }
    let ledger = LedgerRepository::open(&path).expect("Reopen failed");
    let alice = ledger.get_player("alice").expect("Query failed").expect("Persisted");
    assert_eq!(*alice.wins(), 1);
    assert_eq!(ledger.entries().expect("Query failed").len(), 1);
}
