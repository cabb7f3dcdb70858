//! The XBoard / CECP (Chess Engine Communication Protocol) surface.
//!
//! This module only translates between CECP's text tokens and the engine's internal types
//! (`Board`, `PreLimits`, the option map); all actual decision-making lives in [`engine`]
//! and [`search`](::search). It mirrors [`uci`](::uci) closely, differing only in the token
//! set and in a few protocol quirks (the engine moves on its own each turn rather than
//! waiting for an explicit `go`, and the GUI plays "usermove"s instead of "position ...
//! moves").

use chess_core::Board;

use time::uci_timer::{PreLimits, UCITimer};

/// A single CECP `level MPS BASE INC` time control.
pub struct CecpLevel {
    pub moves_per_session: u32,
    pub base_msec: i64,
    pub inc_msec: i64,
}

/// Parses the operand of a `level MPS BASE INC` command, where `BASE` may be either
/// plain minutes (`5`) or `MIN:SEC` (`5:30`).
pub fn parse_level(args: &[&str]) -> Option<CecpLevel> {
    if args.len() < 3 {
        return None;
    }
    let mps: u32 = args[0].parse().ok()?;
    let base_msec: i64 = if let Some(idx) = args[1].find(':') {
        let (mins, secs) = args[1].split_at(idx);
        let mins: i64 = mins.parse().ok()?;
        let secs: i64 = secs[1..].parse().ok()?;
        (mins * 60 + secs) * 1000
    } else {
        args[1].parse::<i64>().ok()? * 60 * 1000
    };
    let inc_msec: i64 = (args[2].parse::<f64>().ok()? * 1000.0) as i64;
    Some(CecpLevel {
        moves_per_session: mps,
        base_msec,
        inc_msec,
    })
}

/// Builds a [`PreLimits`] out of a `level` control plus the most recently reported
/// `time` / `otim` clocks (in centiseconds, per CECP convention).
pub fn limits_from_level(level: &CecpLevel, time_centis: i64, otim_centis: i64, us_white: bool) -> PreLimits {
    let mut limit = PreLimits::blank();
    let mut timer = UCITimer::blank();
    let (w, b) = if us_white {
        (time_centis * 10, otim_centis * 10)
    } else {
        (otim_centis * 10, time_centis * 10)
    };
    timer.time_msec[0] = w;
    timer.time_msec[1] = b;
    timer.inc_msec[0] = level.inc_msec;
    timer.inc_msec[1] = level.inc_msec;
    timer.moves_to_go = level.moves_per_session;
    limit.time = Some(timer);
    limit
}

/// Parses a `setboard FEN` operand, same grammar as the UCI counterpart.
pub fn setboard_parse_board(args: &[&str]) -> Option<Board> {
    let fen_string: String = args.join(" ");
    Board::from_fen(&fen_string).ok()
}

/// Checks whether `mov` (algebraic, e.g. `e2e4`) is a legal move on `board` and, if so,
/// applies it in place.
pub fn apply_usermove(board: &mut Board, mov: &str) -> bool {
    let all_moves = board
        .generate_moves()
        .iter()
        .map(|m| m.stringify())
        .collect::<Vec<String>>();
    if all_moves.contains(&mov.to_string()) {
        return board.apply_uci_move(mov);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parse_plain_minutes() {
        let args: Vec<&str> = "40 5 0".split_whitespace().collect();
        let level = parse_level(&args).unwrap();
        assert_eq!(level.moves_per_session, 40);
        assert_eq!(level.base_msec, 5 * 60 * 1000);
        assert_eq!(level.inc_msec, 0);
    }

    #[test]
    fn level_parse_min_sec() {
        let args: Vec<&str> = "0 5:30 12".split_whitespace().collect();
        let level = parse_level(&args).unwrap();
        assert_eq!(level.moves_per_session, 0);
        assert_eq!(level.base_msec, (5 * 60 + 30) * 1000);
        assert_eq!(level.inc_msec, 12_000);
    }

    #[test]
    fn usermove_rejects_illegal() {
        let mut board = Board::start_pos();
        assert!(!apply_usermove(&mut board, "e2e5"));
        assert_eq!(board.moves_played(), 0);
    }

    #[test]
    fn usermove_applies_legal() {
        let mut board = Board::start_pos();
        assert!(apply_usermove(&mut board, "e2e4"));
        assert_eq!(board.moves_played(), 1);
    }
}
