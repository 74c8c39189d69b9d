//! Tests for the opponent strategies behind each difficulty tier.

use rand::SeedableRng;
use rand::rngs::StdRng;
use strictly_tictactoe_bot::{
    Board, CELL_COUNT, Difficulty, GameError, GreedyStrategy, Mark, MixedStrategy, MoveStrategy,
};

fn board_from(layout: &str) -> Board {
    let mut marks = [None; CELL_COUNT];
    for (cell, ch) in layout.chars().enumerate() {
        marks[cell] = match ch {
            'X' => Some(Mark::X),
            'O' => Some(Mark::O),
            _ => None,
        };
    }
    Board::from_marks(marks)
}

#[test]
fn test_hard_blocks_before_taking_center() {
    // [A, A, _, _, B, _, _, _, _] with B to move.
    let board = board_from("XX..O....");
    let mut rng = StdRng::seed_from_u64(1);

    let cell = Difficulty::Hard
        .strategy()
        .select_move(&board, Mark::O, Mark::X, &mut rng)
        .expect("board has room");
    assert_eq!(cell, 2);
}

#[test]
fn test_hard_takes_center_on_empty_board() {
    let mut rng = StdRng::seed_from_u64(1);
    let cell = Difficulty::Hard
        .strategy()
        .select_move(&Board::new(), Mark::X, Mark::O, &mut rng)
        .expect("board has room");
    assert_eq!(cell, 4);
}

#[test]
fn test_hard_prefers_win_over_block() {
    // O can win on 5; X threatens 2.
    let board = board_from("XX.OO....");
    assert_eq!(GreedyStrategy::choose(&board, Mark::O, Mark::X).ok(), Some(5));
}

#[test]
fn test_hard_is_deterministic() {
    let board = board_from("X...O...X");
    let strategy = Difficulty::Hard.strategy();
    let picks: Vec<usize> = (0..20)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            strategy
                .select_move(&board, Mark::O, Mark::X, &mut rng)
                .expect("board has room")
        })
        .collect();
    assert!(picks.iter().all(|&c| c == picks[0]));
    // No win or block, center taken: first free corner.
    assert_eq!(picks[0], 2);
}

#[test]
fn test_easy_only_returns_empty_cells() {
    let board = board_from("XO.XO.O.X");
    let empty = board.empty_cells();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let cell = Difficulty::Easy
            .strategy()
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .expect("board has room");
        assert!(empty.contains(&cell), "picked occupied cell {}", cell);
    }
}

#[test]
fn test_easy_reaches_every_empty_cell() {
    let board = board_from("X...O....");
    let mut rng = StdRng::seed_from_u64(7);
    let mut seen = [false; CELL_COUNT];
    for _ in 0..500 {
        let cell = Difficulty::Easy
            .strategy()
            .select_move(&board, Mark::X, Mark::O, &mut rng)
            .expect("board has room");
        seen[cell] = true;
    }
    for cell in board.empty_cells() {
        assert!(seen[cell], "cell {} never chosen", cell);
    }
}

#[test]
fn test_medium_only_returns_empty_cells() {
    let board = board_from("XOX.O.X..");
    let empty = board.empty_cells();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let cell = Difficulty::Medium
            .strategy()
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .expect("board has room");
        assert!(empty.contains(&cell));
    }
}

#[test]
fn test_medium_usually_takes_the_win() {
    // O wins on 7 (column 1). Expected rate is 0.7 + 0.3 / 4 = 0.775.
    let board = board_from("XOX.O.X..");
    let mut rng = StdRng::seed_from_u64(11);
    let wins = (0..400)
        .filter(|_| {
            Difficulty::Medium
                .strategy()
                .select_move(&board, Mark::O, Mark::X, &mut rng)
                .expect("board has room")
                == 7
        })
        .count();
    assert!((240..=360).contains(&wins), "took the win {} times", wins);
}

#[test]
fn test_medium_blocks_only_part_of_the_time() {
    // X threatens 2, O has no win, 7 cells are empty. Blocking happens at
    // 0.7 * 0.6 + 0.3 / 7 ~= 0.463; otherwise the strategic branch takes
    // the center at 0.7 * 0.4 + 0.3 / 7 ~= 0.323.
    let board = board_from("XX.......");
    let mut rng = StdRng::seed_from_u64(21);
    let mut counts = [0usize; CELL_COUNT];
    for _ in 0..2000 {
        let cell = Difficulty::Medium
            .strategy()
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .expect("board has room");
        counts[cell] += 1;
    }
    assert!((820..=1030).contains(&counts[2]), "blocked {} times", counts[2]);
    assert!((560..=730).contains(&counts[4]), "took center {} times", counts[4]);
}

#[test]
fn test_mixed_always_strategic_blocks() {
    let always = MixedStrategy::new(1.0, 1.0);
    let mut rng = StdRng::seed_from_u64(5);
    let board = board_from("XX..O....");
    assert_eq!(
        always
            .select_move(&board, Mark::O, Mark::X, &mut rng)
            .expect("board has room"),
        2
    );
}

#[test]
fn test_every_tier_reports_full_board() {
    let board = board_from("XOXXOOOXX");
    let mut rng = StdRng::seed_from_u64(0);
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        assert!(matches!(
            difficulty
                .strategy()
                .select_move(&board, Mark::O, Mark::X, &mut rng),
            Err(GameError::NoMoveAvailable)
        ));
    }
}

#[test]
fn test_difficulty_parses_case_insensitively() {
    assert_eq!("HARD".parse::<Difficulty>().ok(), Some(Difficulty::Hard));
    assert_eq!("easy".parse::<Difficulty>().ok(), Some(Difficulty::Easy));
    assert!("nightmare".parse::<Difficulty>().is_err());
    assert_eq!(Difficulty::default(), Difficulty::Medium);
    assert_eq!(Difficulty::Medium.to_string(), "medium");
}
