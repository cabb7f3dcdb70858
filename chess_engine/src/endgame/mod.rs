//! Endgame knowledge plugged into the evaluator and search as bounded oracles.

pub mod bitbases;
