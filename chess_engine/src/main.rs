extern crate chess_engine;

use std::io;

use chess_engine::engine::CorvidSearcher;

/// Reads the GUI's opening line and hands off to the matching protocol loop. UCI GUIs
/// open with `uci`; CECP/XBoard GUIs open with `xboard`. Anything else is treated as
/// a UCI command so the line isn't silently dropped.
fn main() {
    let mut first_line = String::new();
    io::stdin().read_line(&mut first_line).ok();
    let first_command = first_line.split_whitespace().next().unwrap_or("");

    let mut searcher = CorvidSearcher::init(true);
    if first_command == "xboard" {
        searcher.xboard();
    } else {
        searcher.uci();
    }
}
