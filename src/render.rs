//! Plain-text rendering of sessions, ledger results and errors.

use crate::db::{GameOutcome, PlayerAggregate, SortKey, UserStats};
use crate::games::tictactoe::{Difficulty, GameError, Outcome, Session, Turn};
use crate::orchestrator::TurnOutcome;

/// Status line for a session.
pub fn status_line(session: &Session) -> &'static str {
    match session.outcome() {
        Outcome::PlayerWin => {
            "Verily, thou hast emerged victorious! Type 'start' for another contest."
        }
        Outcome::OpponentWin => {
            "Alas, thou hast been defeated! Type 'start' for a chance to restore thy honor."
        }
        Outcome::Draw => "Lo! A stalemate! Type 'start' to break this impasse.",
        Outcome::InProgress => match session.whose_turn() {
            Turn::Player => "Make thy move, noble challenger!",
            Turn::Opponent => "Now I shall contemplate my strategy...",
        },
    }
}

/// Board plus status and difficulty.
pub fn render_session(session: &Session) -> String {
    format!(
        "{}\n\n{}\nDifficulty: {} - {}",
        session.board().display(),
        status_line(session),
        session.difficulty(),
        session.difficulty().description()
    )
}

/// One line announcing an opponent reply.
pub fn render_reply(cell: usize, outcome: TurnOutcome) -> String {
    let line = match outcome {
        TurnOutcome::OpponentWin => "My strategy hath prevailed this day!",
        TurnOutcome::Draw => "Neither warrior could best the other.",
        _ => "Behold my move!",
    };
    format!("I place my mark upon square {}. {}", cell + 1, line)
}

/// Leaderboard table.
pub fn render_leaderboard(
    players: &[PlayerAggregate],
    sort: SortKey,
    difficulty: Option<Difficulty>,
) -> String {
    if players.is_empty() {
        return "No warriors have yet been recorded in the annals of history.".to_string();
    }
    let mut out = match difficulty {
        Some(d) => format!("Hall of Fame ({d}, by {sort})\n"),
        None => format!("Hall of Fame (by {sort})\n"),
    };
    for (rank, player) in players.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<20} {:>3} pts  {}W/{}L/{}D  {:.0}%\n",
            rank + 1,
            player.label(),
            player.points(),
            player.wins(),
            player.losses(),
            player.draws(),
            player.win_rate() * 100.0
        ));
    }
    out
}

/// A player's record and recent games.
pub fn render_stats(stats: &UserStats) -> String {
    let a = stats.aggregate();
    let mut out = format!(
        "Battle Record of {}\nGames: {}  Wins: {}  Losses: {}  Draws: {}  Points: {}  Win rate: {:.0}%\n",
        a.label(),
        a.games_played(),
        a.wins(),
        a.losses(),
        a.draws(),
        a.points(),
        a.win_rate() * 100.0
    );
    if stats.recent_games().is_empty() {
        return out;
    }
    out.push_str("Recent battles:\n");
    for game in stats.recent_games() {
        let result = match game.outcome_for(a.id()) {
            Some(GameOutcome::Win) => "Victory",
            Some(GameOutcome::Loss) => "Defeat",
            Some(GameOutcome::Draw) | None => "Draw",
        };
        out.push_str(&format!(
            "  {}  {:<7} vs {}  ({})\n",
            game.played_at().format("%Y-%m-%d"),
            result,
            game.opponent_of(a.id()).unwrap_or("?"),
            game.difficulty_tag().unwrap_or("unknown")
        ));
    }
    out
}

/// User-facing text for an error.
pub fn render_error(err: &GameError) -> String {
    match err {
        GameError::InvalidMove(_) => {
            "That square cannot be taken! Choose an empty square between 1 and 9.".to_string()
        }
        GameError::OutOfTurn => "Hold thy hand! 'Tis not thy turn to place a mark.".to_string(),
        GameError::GameAlreadyOver => {
            "The battle is concluded! Type 'start' to begin anew.".to_string()
        }
        GameError::NotFound(_) => "No battles have been recorded for thee yet.".to_string(),
        other => format!("Something went awry: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_shows_numbered_cells() {
        let session = Session::new("p1", Difficulty::Easy);
        let text = render_session(&session);
        assert!(text.contains(" 1 | 2 | 3 "));
        assert!(text.contains("Make thy move"));
        assert!(text.contains("easy"));
    }

    #[test]
    fn empty_leaderboard_has_placeholder() {
        let text = render_leaderboard(&[], SortKey::Points, None);
        assert!(text.contains("No warriors"));
    }

    #[test]
    fn reply_uses_one_based_cell() {
        assert!(render_reply(4, TurnOutcome::PlayerToMove).contains("square 5"));
    }
}
