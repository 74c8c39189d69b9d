//! Tests for turn sequencing and ledger recording.

use strictly_tictactoe_bot::{
    Difficulty, GameError, LedgerRepository, Orchestrator, Outcome, Participant, Session, Turn,
    TurnOutcome,
};

const BOT: &str = "tictactoe-bot";

fn setup() -> Orchestrator {
    let ledger = LedgerRepository::in_memory().expect("Failed to open ledger");
    let bot = Participant::new(BOT.to_string(), Some("Ye Olde Bot".to_string()), true);
    Orchestrator::with_seed(ledger, bot, "tictactoe", 7)
}

#[test]
fn test_player_move_hands_turn_to_opponent() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Hard);

    let report = orchestrator
        .apply_player_move(&mut session, 0)
        .expect("Move failed");
    assert_eq!(*report.cell(), 0);
    assert_eq!(*report.outcome(), TurnOutcome::OpponentToMove);
    assert!(report.entry().is_none());
    assert_eq!(session.whose_turn(), Turn::Opponent);
    assert_eq!(session.outcome(), Outcome::InProgress);
}

#[test]
fn test_hard_opponent_takes_center_then_blocks() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Hard);

    orchestrator
        .apply_player_move(&mut session, 0)
        .expect("Move failed");
    let reply = orchestrator
        .apply_opponent_move(&mut session)
        .expect("Reply failed");
    assert_eq!(*reply.cell(), 4);
    assert_eq!(*reply.outcome(), TurnOutcome::PlayerToMove);

    orchestrator
        .apply_player_move(&mut session, 1)
        .expect("Move failed");
    let reply = orchestrator
        .apply_opponent_move(&mut session)
        .expect("Reply failed");
    assert_eq!(*reply.cell(), 2);
    assert_eq!(session.whose_turn(), Turn::Player);
}

#[test]
fn test_diagonal_win_is_recorded() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Easy);
    session.set_player_name(Some("Alice".to_string()));

    // Reach [X, O, O, _, X, _, _, _, _] with the player to move.
    orchestrator.apply_player_move(&mut session, 0).expect("Move failed");
    session.apply(Turn::Opponent, 1).expect("Opponent move failed");
    orchestrator.apply_player_move(&mut session, 4).expect("Move failed");
    session.apply(Turn::Opponent, 2).expect("Opponent move failed");

    let report = orchestrator
        .apply_player_move(&mut session, 8)
        .expect("Move failed");
    assert_eq!(*report.outcome(), TurnOutcome::PlayerWin);
    assert_eq!(session.outcome(), Outcome::PlayerWin);

    let entry = report.entry().as_ref().expect("Game should be recorded");
    assert_eq!(entry.winner_id().as_deref(), Some("alice"));
    assert_eq!(entry.game_type(), "tictactoe");
    assert_eq!(entry.difficulty(), Some(Difficulty::Easy));

    let ledger = orchestrator.ledger();
    let alice = ledger.get_player("alice").expect("Query failed").expect("Alice recorded");
    assert_eq!(*alice.wins(), 1);
    assert_eq!(*alice.points(), 3);
    assert_eq!(alice.display_name().as_deref(), Some("Alice"));
    assert!(!*alice.is_bot());

    let bot = ledger.get_player(BOT).expect("Query failed").expect("Bot recorded");
    assert_eq!(*bot.losses(), 1);
    assert_eq!(*bot.points(), 0);
    assert!(*bot.is_bot());
}

#[test]
fn test_finished_game_rejects_moves_without_change() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Easy);
    orchestrator.apply_player_move(&mut session, 0).expect("Move failed");
    session.apply(Turn::Opponent, 1).expect("Opponent move failed");
    orchestrator.apply_player_move(&mut session, 4).expect("Move failed");
    session.apply(Turn::Opponent, 2).expect("Opponent move failed");
    orchestrator.apply_player_move(&mut session, 8).expect("Move failed");

    let before = session.clone();
    assert!(matches!(
        orchestrator.apply_player_move(&mut session, 3),
        Err(GameError::GameAlreadyOver)
    ));
    assert!(matches!(
        orchestrator.apply_opponent_move(&mut session),
        Err(GameError::GameAlreadyOver)
    ));
    assert_eq!(session, before);
    assert_eq!(orchestrator.ledger().entries().expect("Query failed").len(), 1);
}

#[test]
fn test_out_of_turn_and_invalid_moves_are_rejected() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Medium);

    assert!(matches!(
        orchestrator.apply_opponent_move(&mut session),
        Err(GameError::OutOfTurn)
    ));
    assert!(matches!(
        orchestrator.apply_player_move(&mut session, 9),
        Err(GameError::InvalidMove(9))
    ));

    orchestrator.apply_player_move(&mut session, 4).expect("Move failed");
    let before = session.clone();
    assert!(matches!(
        orchestrator.apply_player_move(&mut session, 0),
        Err(GameError::OutOfTurn)
    ));
    assert_eq!(session, before);

    orchestrator.apply_opponent_move(&mut session).expect("Reply failed");
    assert!(matches!(
        orchestrator.apply_player_move(&mut session, 4),
        Err(GameError::InvalidMove(4))
    ));
}

#[test]
fn test_full_board_without_line_is_draw() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Hard);

    // X: 0 2 3 7 8, O: 1 4 5 6.
    for (player, opponent) in [(0, 1), (2, 4), (3, 5), (7, 6)] {
        orchestrator
            .apply_player_move(&mut session, player)
            .expect("Move failed");
        session.apply(Turn::Opponent, opponent).expect("Opponent move failed");
    }
    let report = orchestrator
        .apply_player_move(&mut session, 8)
        .expect("Move failed");
    assert_eq!(*report.outcome(), TurnOutcome::Draw);
    assert_eq!(session.outcome(), Outcome::Draw);

    let entry = report.entry().as_ref().expect("Draw should be recorded");
    assert!(entry.winner_id().is_none());

    let ledger = orchestrator.ledger();
    for id in ["alice", BOT] {
        let player = ledger.get_player(id).expect("Query failed").expect("Recorded");
        assert_eq!(*player.draws(), 1);
        assert_eq!(*player.points(), 1);
        assert_eq!(*player.games_played(), 1);
    }
}

#[test]
fn test_new_game_twice_keeps_difficulty() {
    let orchestrator = setup();
    let mut session = Session::new("alice", Difficulty::Hard);
    orchestrator.apply_player_move(&mut session, 0).expect("Move failed");

    for _ in 0..2 {
        session.reset();
        assert!(session.board().empty_cells().len() == 9);
        assert_eq!(session.outcome(), Outcome::InProgress);
        assert_eq!(session.whose_turn(), Turn::Player);
        assert_eq!(session.difficulty(), Difficulty::Hard);
    }
}

#[test]
fn test_seeded_games_replay_identically() {
    let play = || {
        let orchestrator = setup();
        let mut session = Session::new("alice", Difficulty::Easy);
        let mut replies = Vec::new();
        for cell in [0, 1, 2, 3, 4, 5, 6, 7, 8] {
            match orchestrator.apply_player_move(&mut session, cell) {
                Ok(report) if *report.outcome() == TurnOutcome::OpponentToMove => {
                    let reply = orchestrator
                        .apply_opponent_move(&mut session)
                        .expect("Reply failed");
                    replies.push(*reply.cell());
                    if reply.outcome().is_terminal() {
                        break;
                    }
                }
                Ok(_) => break,
                Err(GameError::InvalidMove(_)) => continue,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        replies
    };
    assert_eq!(play(), play());
}
