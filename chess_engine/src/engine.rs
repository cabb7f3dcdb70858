//! The main searching structure.

use std::io;
use std::sync::atomic::Ordering;

use chess_core::BitMove;
use chess_core::Board;

use consts::*;
use threadpool::threadpool;
use time::uci_timer::PreLimits;
use uci::options::{OptionWork, OptionsMap};
use uci::parse;
use xboard;

use search::eval::Evaluation;

// --------- STATIC VARIABLES

pub static ID_NAME: &str = "Corvid";
pub static ID_AUTHORS: &str = "The Corvid Authors";
pub static VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(PartialEq)]
enum SearchType {
    None,
    Search,
    Ponder,
}

pub struct CorvidSearcher {
    options: OptionsMap,
    search_mode: SearchType,
    board: Board,
    // XBoard-only state
    force_mode: bool,
    post: bool,
    xboard_level: Option<xboard::CecpLevel>,
    computer_is_white: bool,
}

impl CorvidSearcher {
    pub fn init(use_stdout: bool) -> Self {
        init_globals();
        USE_STDOUT.store(use_stdout, Ordering::Relaxed);
        CorvidSearcher {
            options: OptionsMap::new(),
            search_mode: SearchType::None,
            board: Board::start_pos(),
            force_mode: false,
            post: false,
            xboard_level: None,
            computer_is_white: false,
        }
    }

    pub fn uci(&mut self) {
        self.uci_startup();
        let mut full_command = String::new();
        loop {
            full_command.clear();
            io::stdin().read_line(&mut full_command).ok().unwrap();
            let args: Vec<&str> = full_command.split_whitespace().collect();
            let command: &str = args.first().unwrap_or(&"");
            match command {
                "" => continue,
                "uci" => self.uci_startup(),
                "setoption" => self.apply_option(&full_command),
                "options" | "alloptions" => self.options.display_all(),
                "ucinewgame" => self.clear_search(),
                "isready" => println!("readyok"),
                "position" => {
                    if let Some(b) = parse::position_parse_board(&args[1..]) {
                        self.board = b;
                    } else {
                        println!("unable to parse board");
                    }
                }
                "setboard" => {
                    if let Some(b) = parse::setboard_parse_board(&args[1..]) {
                        self.board = b;
                    } else {
                        println!("unable to parse board");
                    }
                }
                "go" => self.uci_go(&args[1..]),
                "quit" => {
                    self.halt();
                    break;
                }
                "stop" => self.halt(),
                "eval" => Evaluation::trace(&self.board),
                _ => print!("Unknown Command: {}", full_command),
            }
            self.apply_all_options();
        }
    }

    pub fn clear_search(&mut self) {
        self.clear_tt();
        threadpool().clear_all();
    }

    fn uci_go(&mut self, args: &[&str]) {
        let limit = parse::parse_time(&args);
        threadpool().uci_search(&self.board, &limit.create())
    }

    /// Runs the engine under the XBoard / CECP protocol instead of UCI. The GUI drives
    /// play by sending `usermove`s; after each one (unless `force` mode is active) the
    /// engine searches and replies with its own `move <...>`.
    pub fn xboard(&mut self) {
        use chess_core::Player;

        println!();
        let mut full_command = String::new();
        let mut time_centis: i64 = 0;
        let mut otim_centis: i64 = 0;
        loop {
            full_command.clear();
            if io::stdin().read_line(&mut full_command).ok().unwrap() == 0 {
                break;
            }
            let args: Vec<&str> = full_command.split_whitespace().collect();
            let command: &str = args.first().unwrap_or(&"");
            match command {
                "" => continue,
                "xboard" => {}
                "protover" => {
                    println!("feature myname=\"{} {}\"", ID_NAME, VERSION);
                    println!(
                        "feature setboard=1 usermove=1 ping=1 draw=1 sigint=0 sigterm=0 \
                         reuse=1 analyze=0 colors=0 done=1"
                    );
                }
                "new" => {
                    self.halt();
                    self.clear_search();
                    self.board = Board::start_pos();
                    self.force_mode = false;
                    self.computer_is_white = false;
                    self.xboard_level = None;
                }
                "force" => {
                    self.halt();
                    self.force_mode = true;
                }
                "go" => {
                    self.force_mode = false;
                    self.computer_is_white = self.board.turn() == Player::White;
                    self.xboard_move(time_centis, otim_centis);
                }
                "playother" => {
                    self.force_mode = false;
                    self.computer_is_white = self.board.turn() != Player::White;
                }
                "white" => self.computer_is_white = false,
                "black" => self.computer_is_white = true,
                "level" => {
                    self.xboard_level = xboard::parse_level(&args[1..]);
                }
                "time" => {
                    if let Some(t) = args.get(1).and_then(|s| s.parse::<i64>().ok()) {
                        time_centis = t;
                    }
                }
                "otim" => {
                    if let Some(t) = args.get(1).and_then(|s| s.parse::<i64>().ok()) {
                        otim_centis = t;
                    }
                }
                "setboard" => {
                    if let Some(b) = xboard::setboard_parse_board(&args[1..]) {
                        self.board = b;
                    } else {
                        println!("Illegal position");
                    }
                }
                "usermove" => {
                    if let Some(mov) = args.get(1) {
                        if !xboard::apply_usermove(&mut self.board, mov) {
                            println!("Illegal move: {}", mov);
                        } else if self.report_game_end() {
                            // game already over, nothing to reply with
                        } else if !self.force_mode
                            && self.board.turn() == if self.computer_is_white {
                                Player::White
                            } else {
                                Player::Black
                            }
                        {
                            self.xboard_move(time_centis, otim_centis);
                        }
                    }
                }
                "ping" => {
                    if let Some(n) = args.get(1) {
                        println!("pong {}", n);
                    }
                }
                "post" => self.post = true,
                "nopost" => self.post = false,
                "hard" | "easy" | "random" | "computer" | "accepted" | "rejected" | "name"
                | "rating" | "ics" | "variant" | "st" | "sd" | "memory" | "cores" | "draw" => {}
                "undo" | "remove" => self.halt(),
                "quit" => {
                    self.halt();
                    break;
                }
                "?" => self.halt(),
                "eval" => Evaluation::trace(&self.board),
                _ => println!("Error (unknown command): {}", full_command.trim_end()),
            }
            self.apply_all_options();
        }
    }

    fn xboard_move(&mut self, time_centis: i64, otim_centis: i64) {
        if self.report_game_end() {
            return;
        }
        let limit = match self.xboard_level {
            Some(ref level) => {
                xboard::limits_from_level(level, time_centis, otim_centis, self.computer_is_white)
            }
            None => {
                let mut limit = PreLimits::blank();
                limit.move_time = Some(1000);
                limit
            }
        };
        self.search_mode = SearchType::Search;
        threadpool().uci_search(&self.board, &limit.create());
        threadpool().wait_for_finish();
        let mov = threadpool().best_move();
        self.search_mode = SearchType::None;
        if mov.is_null() {
            return;
        }
        println!("move {}", mov.stringify());
        self.board.apply_move(mov);
        self.report_game_end();
    }

    /// Prints the CECP result line and returns `true` if the game on `self.board` is over.
    fn report_game_end(&self) -> bool {
        if self.board.checkmate() {
            if self.board.turn() == chess_core::Player::White {
                println!("0-1 {{Black mates}}");
            } else {
                println!("1-0 {{White mates}}");
            }
            true
        } else if self.board.stalemate() {
            println!("1/2-1/2 {{Stalemate}}");
            true
        } else if self.board.insufficient_material() {
            println!("1/2-1/2 {{Insufficient material}}");
            true
        } else if self.board.threefold_repetition() {
            println!("1/2-1/2 {{Draw by repetition}}");
            true
        } else if self.board.fifty_move_rule() {
            println!("1/2-1/2 {{Draw by fifty move rule}}");
            true
        } else {
            false
        }
    }

    fn apply_option(&mut self, full_command: &str) {
        let mut args = full_command.split_whitespace();
        args.next().unwrap(); // setoption
        if let Some(non_name) = args.next() {
            if non_name != "name" {
                println!("setoption [name]");
                return;
            }
        } else {
            println!("setoption name [name] ");
            return;
        }
        let mut name = String::new();
        let mut value = String::new();

        if let Some(third_arg) = args.next() {
            //[should be name of the option]
            name += third_arg;
        } else {
            println!("setoption name [name]");
            return;
        }

        'nv: while let Some(ref partial_name) = args.next() {
            if *partial_name == "value" {
                value = args
                    .map(|s| s.to_string() + " ")
                    .collect::<String>()
                    .trim()
                    .to_string();
                if &value == "" {
                    println!("forgot a value!");
                    return;
                }
                break 'nv;
            } else {
                name += " ";
                name += partial_name;
            }
        }

        if !self.options.apply_option(&name, &value) {
            println!("unable to apply option: '{}'", full_command);
        } else {
            self.apply_all_options();
        }
    }

    fn apply_all_options(&mut self) {
        while let Some(work) = self.options.work() {
            if self.is_searching() && !work.usable_while_searching() {
                println!("unable to apply work");
            } else {
                match work {
                    OptionWork::ClearTT => self.clear_tt(),
                    OptionWork::ResizeTT(mb) => self.resize_tt(mb),
                    OptionWork::Threads(num) => threadpool().set_thread_count(num),
                }
            }
        }
    }

    fn uci_startup(&self) {
        println!("id name {}", ID_NAME);
        println!("id authors {}", ID_AUTHORS);
        self.options.display_all();
        println!("uciok");
    }

    pub fn search(&mut self, board: &Board, limit: &PreLimits) {
        self.search_mode = SearchType::Search;
        threadpool().uci_search(board, &(limit.clone().create()));
    }

    pub fn halt(&mut self) {
        self.search_mode = SearchType::None;
        threadpool().set_stop(true);
    }

    pub fn stop_search_get_move(&mut self) -> BitMove {
        self.search_mode = SearchType::None;
        if self.is_searching() {
            threadpool().set_stop(true);
            threadpool().wait_for_finish();
            threadpool().best_move()
        } else {
            BitMove::null()
        }
    }

    pub fn await_move(&mut self) -> BitMove {
        if self.is_searching() {
            threadpool().wait_for_finish();
            threadpool().best_move()
        } else {
            BitMove::null()
        }
    }

    pub fn is_searching(&self) -> bool {
        if self.search_mode == SearchType::None {
            return false;
        }
        true
    }

    pub fn hash_percent(&self) -> f64 {
        tt().hash_percent()
    }

    pub fn clear_tt(&mut self) {
        unsafe { tt().clear() };
    }

    pub fn resize_tt(&mut self, mb: usize) {
        unsafe { tt().resize_to_megabytes(mb) };
    }

    pub fn use_stdout(&mut self, stdout: bool) {
        threadpool().stdout(stdout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ply_3() {
        let mut limit = PreLimits::blank();
        limit.depth = Some(3);
        let board = Board::start_pos();
        let mut s = CorvidSearcher::init(false);
        s.search(&board, &limit);
        s.await_move();
    }
}
