//! Search, transposition table, threading, time management, and protocol surfaces (UCI and
//! XBoard/CECP) built on top of the `chess_core` board representation.
//!
//! This crate is not meant to be used as a library dependency by other projects; it backs the
//! `corvid` executable defined in `src/main.rs`.

#![allow(dead_code)]
#![cfg_attr(test, allow(dead_code))]

#[macro_use]
extern crate bitflags;
extern crate chess_core;
extern crate chrono;
extern crate crossbeam_utils;
#[macro_use]
extern crate lazy_static;
extern crate num_cpus;
extern crate prefetch;
extern crate rand;

pub mod consts;
pub mod endgame;
pub mod engine;
pub mod movepick;
pub mod root_moves;
pub mod search;
pub mod sync;
pub mod tables;
pub mod threadpool;
pub mod time;
pub mod uci;
pub mod xboard;

pub use consts::*;
