mod pick;

use chess_core::board::movegen::{Legal, MoveGen, PseudoLegal};
use chess_core::core::mono_traits::*;
use chess_core::helper::prelude::piecetype_value;
use chess_core::{BitMove, Board, Piece, PieceType, ScoringMoveList, SQ};

use tables::prelude::*;

use self::pick::Pick;

/// Qsearch positions at or below this depth only consider moves that recapture on the
/// square the previous move captured on.
const DEPTH_QS_RECAPTURES: i16 = -5;

pub trait MovePickerType: Sized {
    fn next(&mut self, board: &Board, skip_quiets: bool) -> Option<BitMove>;
}

/// Incrementally generates and orders moves for a single search node, a stage at a time,
/// rather than generating and sorting the entire move list up-front.
pub struct MovePicker<MPT: MovePickerType> {
    picker: MPT,
    board: *const Board,
}

impl<MPT: MovePickerType> MovePicker<MPT> {
    fn new(board: *const Board, picker: MPT) -> Self {
        MovePicker { picker, board }
    }

    #[inline]
    pub fn next(&mut self, skip_quiets: bool) -> Option<BitMove> {
        let board: &Board = unsafe { &*self.board };
        self.picker.next(board, skip_quiets)
    }
}

impl MovePicker<MainSearchPicker> {
    pub fn main_search(
        board: &Board,
        depth: i16,
        main_history: &ButterflyHistory,
        capture_history: &CapturePieceToHistory,
        cont_hists: *const [*mut PieceToHistory; 4],
        mut ttm: BitMove,
        killers: [BitMove; 2],
        counter_move: BitMove,
    ) -> Self {
        assert!(!board.in_check());

        if ttm == BitMove::null() || !board.pseudo_legal_move(ttm) {
            ttm = BitMove::null();
        }

        let picker = MainSearchPicker::new(
            depth,
            ttm,
            killers,
            counter_move,
            main_history,
            capture_history,
            cont_hists,
        );
        MovePicker::new(board, picker)
    }
}

impl MovePicker<QSearchPicker> {
    pub fn qsearch(
        board: &Board,
        rev_depth: i16,
        mut ttm: BitMove,
        main_history: &ButterflyHistory,
        capture_history: &CapturePieceToHistory,
        recap_sq: SQ,
    ) -> Self {
        if ttm == BitMove::null() || !board.pseudo_legal_move(ttm) {
            ttm = BitMove::null();
        }

        let picker = QSearchPicker::new(
            rev_depth,
            ttm,
            main_history,
            capture_history,
            recap_sq,
        );
        MovePicker::new(board, picker)
    }
}

/// Scores a move that captures an opponent's piece, using an MVV-LVA base with the capture
/// history used as a tiebreaker.
fn score_capture(board: &Board, mov: BitMove, capture_history: &CapturePieceToHistory) -> i16 {
    let moved_pt: PieceType = board.moved_piece(mov);
    let captured_pt: PieceType = board.captured_piece(mov).unwrap_or(PieceType::None);
    let moved_piece: Piece = Piece::make_lossy(board.turn(), moved_pt);

    let mut score: i32 = i32::from(piecetype_value(captured_pt, true)) * 6
        - i32::from(piecetype_value(moved_pt, true));
    score += i32::from(capture_history[(moved_piece, mov.get_dest(), captured_pt)]);
    score.max(i32::from(i16::min_value())).min(i32::from(i16::max_value())) as i16
}

/// Scores a quiet move using the butterfly (from/to) history and the continuation
/// histories of the one, two, and four plies prior.
fn score_quiet(
    board: &Board,
    mov: BitMove,
    main_history: &ButterflyHistory,
    cont_hists: *const [*mut PieceToHistory; 4],
) -> i16 {
    let moved_pt: PieceType = board.moved_piece(mov);
    let moved_piece: Piece = Piece::make_lossy(board.turn(), moved_pt);

    let mut score: i32 = i32::from(main_history[(board.turn(), mov)]);
    unsafe {
        let hists = &*cont_hists;
        for h in hists.iter() {
            if !h.is_null() {
                score += i32::from((**h)[(moved_piece, mov.get_dest())]);
            }
        }
    }
    score.max(i32::from(i16::min_value())).min(i32::from(i16::max_value())) as i16
}

/// Selects the highest-scoring move at or after `idx`, swaps it to `idx`, and returns it.
/// Mirrors the classic "selection sort as you go" pattern used to avoid sorting a whole
/// move list up-front when most lines never need all of it.
fn pick_best(list: &mut ScoringMoveList, idx: usize) -> Option<BitMove> {
    if idx >= list.len() {
        return None;
    }
    let mut best_i = idx;
    for i in (idx + 1)..list.len() {
        if list[i].score > list[best_i].score {
            best_i = i;
        }
    }
    list.swap(idx, best_i);
    Some(list[idx].bit_move)
}

pub struct MainSearchPicker {
    stage: Pick,
    depth: i16,
    ttm: BitMove,
    killers: [BitMove; 2],
    counter_move: BitMove,

    main_history: *const ButterflyHistory,
    capture_history: *const CapturePieceToHistory,
    cont_hists: *const [*mut PieceToHistory; 4],

    captures: ScoringMoveList,
    bad_captures: ScoringMoveList,
    quiets: ScoringMoveList,

    cap_idx: usize,
    bad_cap_idx: usize,
    quiet_idx: usize,
}

impl MainSearchPicker {
    fn new(
        depth: i16,
        ttm: BitMove,
        killers: [BitMove; 2],
        counter_move: BitMove,
        main_history: &ButterflyHistory,
        capture_history: &CapturePieceToHistory,
        cont_hists: *const [*mut PieceToHistory; 4],
    ) -> Self {
        let stage = if ttm == BitMove::null() {
            Pick::CapturesInit
        } else {
            Pick::MainSearch
        };
        MainSearchPicker {
            stage,
            depth,
            ttm,
            killers,
            counter_move,
            main_history: main_history as *const _,
            capture_history: capture_history as *const _,
            cont_hists,
            captures: ScoringMoveList::default(),
            bad_captures: ScoringMoveList::default(),
            quiets: ScoringMoveList::default(),
            cap_idx: 0,
            bad_cap_idx: 0,
            quiet_idx: 0,
        }
    }

    fn is_pseudo_legal_and_fresh(&self, board: &Board, mov: BitMove) -> bool {
        mov != BitMove::null()
            && mov != self.ttm
            && board.pseudo_legal_move(mov)
    }
}

impl MovePickerType for MainSearchPicker {
    fn next(&mut self, board: &Board, skip_quiets: bool) -> Option<BitMove> {
        match self.stage {
            Pick::MainSearch => {
                self.stage = Pick::CapturesInit;
                Some(self.ttm)
            }
            Pick::CapturesInit => {
                self.captures = MoveGen::generate_scoring::<PseudoLegal, CapturesGenType>(board);
                let capture_history = unsafe { &*self.capture_history };
                for sm in self.captures.iter_mut() {
                    let score = score_capture(board, sm.bit_move, capture_history);
                    sm.score = score;
                }
                self.stage = Pick::GoodCaptures;
                self.next(board, skip_quiets)
            }
            Pick::GoodCaptures => loop {
                match pick_best(&mut self.captures, self.cap_idx) {
                    None => {
                        self.stage = Pick::KillerOne;
                        return self.next(board, skip_quiets);
                    }
                    Some(mov) => {
                        self.cap_idx += 1;
                        if mov == self.ttm {
                            continue;
                        }
                        if board.see_ge(mov, 0) {
                            return Some(mov);
                        }
                        self.bad_captures.push(mov);
                    }
                }
            },
            Pick::KillerOne => {
                self.stage = Pick::KillerTwo;
                let k = self.killers[0];
                if !skip_quiets
                    && self.is_pseudo_legal_and_fresh(board, k)
                    && !board.is_capture(k)
                {
                    return Some(k);
                }
                self.next(board, skip_quiets)
            }
            Pick::KillerTwo => {
                self.stage = Pick::CounterMove;
                let k = self.killers[1];
                if !skip_quiets
                    && k != self.killers[0]
                    && self.is_pseudo_legal_and_fresh(board, k)
                    && !board.is_capture(k)
                {
                    return Some(k);
                }
                self.next(board, skip_quiets)
            }
            Pick::CounterMove => {
                self.stage = Pick::QuietInit;
                let c = self.counter_move;
                if !skip_quiets
                    && c != self.killers[0]
                    && c != self.killers[1]
                    && self.is_pseudo_legal_and_fresh(board, c)
                    && !board.is_capture(c)
                {
                    return Some(c);
                }
                self.next(board, skip_quiets)
            }
            Pick::QuietInit => {
                if skip_quiets {
                    self.stage = Pick::BadCaptures;
                    return self.next(board, skip_quiets);
                }
                self.quiets = MoveGen::generate_scoring::<PseudoLegal, QuietsGenType>(board);
                let main_history = unsafe { &*self.main_history };
                for sm in self.quiets.iter_mut() {
                    let score = score_quiet(board, sm.bit_move, main_history, self.cont_hists);
                    sm.score = score;
                }
                self.stage = Pick::QuietMoves;
                self.next(board, skip_quiets)
            }
            Pick::QuietMoves => {
                if skip_quiets {
                    self.stage = Pick::BadCaptures;
                    return self.next(board, skip_quiets);
                }
                loop {
                    match pick_best(&mut self.quiets, self.quiet_idx) {
                        None => {
                            self.stage = Pick::BadCaptures;
                            return self.next(board, skip_quiets);
                        }
                        Some(mov) => {
                            self.quiet_idx += 1;
                            if mov == self.ttm
                                || mov == self.killers[0]
                                || mov == self.killers[1]
                                || mov == self.counter_move
                            {
                                continue;
                            }
                            return Some(mov);
                        }
                    }
                }
            }
            Pick::BadCaptures => {
                if self.bad_cap_idx >= self.bad_captures.len() {
                    return None;
                }
                let mov = self.bad_captures[self.bad_cap_idx].bit_move;
                self.bad_cap_idx += 1;
                Some(mov)
            }
            _ => None,
        }
    }
}

pub struct QSearchPicker {
    stage: Pick,
    ttm: BitMove,
    recap_sq: SQ,
    recaptures_only: bool,
    in_check: bool,

    main_history: *const ButterflyHistory,
    capture_history: *const CapturePieceToHistory,

    captures: ScoringMoveList,
    checks: ScoringMoveList,
    evasions: ScoringMoveList,

    cap_idx: usize,
    check_idx: usize,
    evasion_idx: usize,
}

impl QSearchPicker {
    fn new(
        rev_depth: i16,
        ttm: BitMove,
        main_history: &ButterflyHistory,
        capture_history: &CapturePieceToHistory,
        recap_sq: SQ,
    ) -> Self {
        let stage = if ttm == BitMove::null() {
            Pick::QSearchInit
        } else {
            Pick::QSearch
        };
        QSearchPicker {
            stage,
            ttm,
            recap_sq,
            recaptures_only: rev_depth <= DEPTH_QS_RECAPTURES,
            in_check: false,
            main_history: main_history as *const _,
            capture_history: capture_history as *const _,
            captures: ScoringMoveList::default(),
            checks: ScoringMoveList::default(),
            evasions: ScoringMoveList::default(),
            cap_idx: 0,
            check_idx: 0,
            evasion_idx: 0,
        }
    }
}

impl MovePickerType for QSearchPicker {
    fn next(&mut self, board: &Board, skip_quiets: bool) -> Option<BitMove> {
        match self.stage {
            Pick::QSearch => {
                self.stage = Pick::QSearchInit;
                Some(self.ttm)
            }
            Pick::QSearchInit => {
                self.in_check = board.in_check();
                let capture_history = unsafe { &*self.capture_history };
                if self.in_check {
                    self.evasions = MoveGen::generate_scoring::<Legal, EvasionsGenType>(board);
                    for sm in self.evasions.iter_mut() {
                        let score = if board.is_capture(sm.bit_move) {
                            score_capture(board, sm.bit_move, capture_history)
                        } else {
                            0
                        };
                        sm.score = score;
                    }
                    self.stage = Pick::AllEvasions;
                } else {
                    self.captures = MoveGen::generate_scoring::<PseudoLegal, CapturesGenType>(board);
                    for sm in self.captures.iter_mut() {
                        let score = score_capture(board, sm.bit_move, capture_history);
                        sm.score = score;
                    }
                    self.stage = Pick::QCaptures;
                }
                self.next(board, skip_quiets)
            }
            Pick::QCaptures => loop {
                match pick_best(&mut self.captures, self.cap_idx) {
                    None => {
                        self.stage = Pick::QChecks;
                        return self.next(board, skip_quiets);
                    }
                    Some(mov) => {
                        self.cap_idx += 1;
                        if mov == self.ttm {
                            continue;
                        }
                        if self.recaptures_only && mov.get_dest() != self.recap_sq {
                            continue;
                        }
                        return Some(mov);
                    }
                }
            },
            Pick::QChecks => {
                if self.recaptures_only {
                    return None;
                }
                if self.check_idx == 0 && self.checks.is_empty() {
                    self.checks = MoveGen::generate_scoring::<PseudoLegal, QuietChecksGenType>(board);
                    let main_history = unsafe { &*self.main_history };
                    for sm in self.checks.iter_mut() {
                        sm.score = i32::from(main_history[(board.turn(), sm.bit_move)])
                            .max(i32::from(i16::min_value()))
                            .min(i32::from(i16::max_value())) as i16;
                    }
                }
                loop {
                    match pick_best(&mut self.checks, self.check_idx) {
                        None => return None,
                        Some(mov) => {
                            self.check_idx += 1;
                            if mov == self.ttm {
                                continue;
                            }
                            return Some(mov);
                        }
                    }
                }
            }
            Pick::AllEvasions => loop {
                match pick_best(&mut self.evasions, self.evasion_idx) {
                    None => return None,
                    Some(mov) => {
                        self.evasion_idx += 1;
                        if mov == self.ttm {
                            continue;
                        }
                        return Some(mov);
                    }
                }
            },
            _ => None,
        }
    }
}
