//! Board representation and move generation for a bitboard-based chess engine.
//!
//! This crate is deliberately split in two. This crate, `chess_core`, owns the board
//! representation, attack tables, move generation, make/unmake, and static evaluation. The
//! search, transposition table wiring, and protocol surfaces live in the sibling `chess_engine`
//! crate, which depends on this one.
//!
//! # Examples
//!
//! ```ignore
//! use chess_core::Board;
//! let board = Board::start_pos();
//! let list = board.generate_moves();
//! ```
//!
//! [`MoveList`]: core/move_list/struct.MoveList.html
//! [`Board`]: board/struct.Board.html

#![allow(dead_code)]
#![cfg_attr(test, allow(dead_code))]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
extern crate mucow;
extern crate num_cpus;
extern crate prefetch;
extern crate rand;
extern crate rayon;

pub mod board;
pub mod bots;
pub mod core;
pub mod helper;
pub mod tools;

pub use board::Board;
pub use core::bitboard::BitBoard;
pub use core::move_list::{MoveList, ScoringMoveList};
pub use core::piece_move::{BitMove, ScoringMove};
pub use core::sq::SQ;
pub use core::{File, Piece, PieceType, Player, Rank};
pub use helper::Helper;

pub mod bot_prelude {
    //! Small reference searchers, kept around for self-play sanity tests of the board and move
    //! generator. The real search lives in `chess_engine`.
    pub use bots::AlphaBetaSearcher;
    pub use bots::IterativeSearcher;
    pub use bots::JamboreeSearcher;
    pub use bots::MiniMaxSearcher;
    pub use bots::ParallelMiniMaxSearcher;
    pub use bots::RandomBot;

    pub use tools::Searcher;
}
