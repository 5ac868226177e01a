//! Go Text Protocol (GTP) support.
//!
//! GTP is a text-based protocol for communicating with Go-playing programs.
//! This module has two halves: coordinate and response helpers shared with
//! the external-engine client, and a GTP version 2 server that exposes the
//! built-in minimax player so the binary can be driven by graphical
//! frontends (or spawned as a test opponent).
//!
//! Vertices use the standard GTP scheme: column letters skip `I`, and row 1
//! is the bottom of the board while the internal origin is top-left.
//!
//! ## Supported Commands
//!
//! - `name` - Return engine name
//! - `version` - Return engine version
//! - `protocol_version` - Return GTP protocol version (2)
//! - `list_commands` - List all supported commands
//! - `known_command <cmd>` - Check if a command is supported
//! - `quit` - Exit the program
//! - `boardsize <size>` - Set board size (9, 13 or 19)
//! - `clear_board` - Reset the board to empty
//! - `komi <value>` - Set komi
//! - `play <color> <vertex>` - Play a move or a pass
//! - `genmove <color>` - Generate and play a move for the given color
//! - `undo` - Take back the last action
//! - `time_settings <main> <byo> <stones>` - Accepted and ignored
//! - `final_status_list <status>` - Always empty (no life-and-death analysis)
//!
//! ## Example
//!
//! ```ignore
//! use tengen::gtp::GtpServer;
//! let mut server = GtpServer::new(19);
//! server.run();
//! ```

use std::io::{self, BufRead, Write};

use crate::board::{Point, Stone};
use crate::bot::{Bot, BotMove};
use crate::constants::{DEFAULT_BOARD_SIZE, EASY_SEARCH_DEPTH, GTP_COLUMNS, SUPPORTED_SIZES};
use crate::game::Game;
use crate::minimax::MinimaxBot;

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "final_status_list",
    "genmove",
    "known_command",
    "komi",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "time_settings",
    "undo",
    "version",
];

/// Format a board point as a GTP vertex such as `D4`. Out-of-range points
/// render as `pass`.
pub fn format_vertex(point: Point, size: usize) -> String {
    let (x, y) = point;
    if x >= size || y >= size {
        return "pass".to_string();
    }
    let col = GTP_COLUMNS.as_bytes()[x] as char;
    format!("{col}{}", size - y)
}

/// Parse a GTP vertex into board coordinates. Returns `None` for anything
/// that is not a well-formed on-board vertex (including `pass`).
pub fn parse_vertex(vertex: &str, size: usize) -> Option<Point> {
    let vertex = vertex.trim();
    let mut chars = vertex.chars();
    let col = chars.next()?.to_ascii_uppercase();
    let x = GTP_COLUMNS.find(col)?;
    let row: usize = chars.as_str().trim().parse().ok()?;
    if x >= size || row == 0 || row > size {
        return None;
    }
    Some((x, size - row))
}

/// Extract the payload from a raw GTP response.
///
/// Everything after the `=` status character (and an optional command id)
/// is returned with surrounding whitespace removed. Error responses and
/// garbage yield an empty string.
pub fn clean_response(raw: &str) -> String {
    match raw.find('=') {
        Some(idx) => {
            let rest = &raw[idx + 1..];
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            rest.trim().to_string()
        }
        None => String::new(),
    }
}

/// The GTP color word for a stone.
pub fn stone_name(stone: Stone) -> &'static str {
    match stone {
        Stone::White => "white",
        _ => "black",
    }
}

/// Parse a GTP color argument.
pub fn parse_stone(arg: &str) -> Option<Stone> {
    match arg.to_lowercase().as_str() {
        "b" | "black" => Some(Stone::Black),
        "w" | "white" => Some(Stone::White),
        _ => None,
    }
}

/// GTP server state: the authoritative rules engine plus the built-in
/// searcher that answers `genmove`.
pub struct GtpServer {
    game: Game,
    bot: MinimaxBot,
}

impl Default for GtpServer {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}

impl GtpServer {
    /// Create a new GTP server for the given board size.
    pub fn new(size: usize) -> Self {
        Self {
            game: Game::new(size),
            bot: MinimaxBot::new(size, EASY_SEARCH_DEPTH),
        }
    }

    /// Run the GTP command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse optional command ID
            let (id, command_line) = Self::parse_id(line);

            // Parse command and arguments
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            log::debug!("gtp <- {command_line}");

            // Execute command
            let response = self.execute(&command, args);

            // Format and send response
            let (success, message) = response;
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(stdout, "\n{prefix}{id_str} {message}\n").unwrap();
            stdout.flush().unwrap();

            // Quit if requested
            if command == "quit" {
                break;
            }
        }
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let mut chars = trimmed.char_indices();

        // Check if line starts with a digit
        if let Some((_, c)) = chars.next() {
            if c.is_ascii_digit() {
                // Find end of number
                let end = chars
                    .find(|(_, c)| !c.is_ascii_digit())
                    .map(|(i, _)| i)
                    .unwrap_or(trimmed.len());

                if let Ok(id) = trimmed[..end].parse::<u32>() {
                    return (Some(id), trimmed[end..].trim());
                }
            }
        }

        (None, trimmed)
    }

    /// Hand the turn over when a client drives the off-turn color.
    fn align_turn(&mut self, color: Stone) {
        if color != self.game.current_stone() {
            self.game.attempt_pass();
        }
    }

    /// Execute a GTP command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, "tengen".to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => {
                let commands = KNOWN_COMMANDS.join("\n");
                (true, commands)
            }

            "known_command" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let known = KNOWN_COMMANDS.contains(&args[0].to_lowercase().as_str());
                (true, if known { "true" } else { "false" }.to_string())
            }

            "quit" => (true, String::new()),

            "boardsize" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                match args[0].parse::<usize>() {
                    Ok(size) if SUPPORTED_SIZES.contains(&size) => {
                        self.game.set_size(size);
                        self.bot.set_board_size(size);
                        (true, String::new())
                    }
                    Ok(_) => (false, "unacceptable size".to_string()),
                    Err(_) => (false, "invalid size".to_string()),
                }
            }

            "clear_board" => {
                self.game.new_game();
                self.bot.init();
                (true, String::new())
            }

            "komi" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                match args[0].parse::<f32>() {
                    Ok(komi) => {
                        self.game.set_komi(komi);
                        (true, String::new())
                    }
                    Err(_) => (false, "invalid komi".to_string()),
                }
            }

            "time_settings" => (true, String::new()),

            "play" => {
                if args.len() < 2 {
                    return (false, "missing arguments".to_string());
                }
                let Some(color) = parse_stone(args[0]) else {
                    return (false, "invalid color".to_string());
                };

                let vertex = args[1].to_lowercase();
                if vertex == "pass" {
                    self.align_turn(color);
                    self.game.attempt_pass();
                    return (true, String::new());
                }

                let Some((x, y)) = parse_vertex(&vertex, self.game.size()) else {
                    return (false, "invalid vertex".to_string());
                };

                self.align_turn(color);
                match self.game.attempt_move(x, y) {
                    Ok(_) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let Some(color) = parse_stone(args[0]) else {
                    return (false, "invalid color".to_string());
                };
                self.align_turn(color);

                self.bot.set_position(self.game.board());
                match self.bot.generate_move(self.game.black_to_move()) {
                    BotMove::Play((x, y)) => match self.game.attempt_move(x, y) {
                        Ok(_) => (true, format_vertex((x, y), self.game.size())),
                        Err(_) => {
                            // The searcher does not track ko; treat a
                            // rejected suggestion as a pass.
                            self.game.attempt_pass();
                            (true, "pass".to_string())
                        }
                    },
                    BotMove::Pass => {
                        self.game.attempt_pass();
                        (true, "pass".to_string())
                    }
                    BotMove::Resign => (true, "resign".to_string()),
                }
            }

            "undo" => {
                if self.game.undo() {
                    (true, String::new())
                } else {
                    (false, "cannot undo".to_string())
                }
            }

            "final_status_list" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                // No life-and-death analysis; every status list is empty.
                (true, String::new())
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = GtpServer::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = GtpServer::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_format_vertex_skips_i_column() {
        assert_eq!(format_vertex((7, 0), 19), "H19");
        assert_eq!(format_vertex((8, 0), 19), "J19");
        assert_eq!(format_vertex((3, 15), 19), "D4");
        assert_eq!(format_vertex((0, 8), 9), "A1");
    }

    #[test]
    fn test_format_vertex_out_of_range_is_pass() {
        assert_eq!(format_vertex((9, 0), 9), "pass");
    }

    #[test]
    fn test_parse_vertex_round_trip() {
        for size in SUPPORTED_SIZES {
            for &(x, y) in &[(0, 0), (size - 1, size - 1), (size / 2, 1)] {
                let vertex = format_vertex((x, y), size);
                assert_eq!(parse_vertex(&vertex, size), Some((x, y)), "{vertex}");
            }
        }
    }

    #[test]
    fn test_parse_vertex_is_case_insensitive() {
        assert_eq!(parse_vertex("d4", 9), parse_vertex("D4", 9));
        assert_eq!(parse_vertex("j1", 19), Some((8, 18)));
    }

    #[test]
    fn test_parse_vertex_rejects_malformed() {
        assert_eq!(parse_vertex("", 9), None);
        assert_eq!(parse_vertex("pass", 9), None);
        assert_eq!(parse_vertex("I5", 19), None);
        assert_eq!(parse_vertex("Z3", 9), None);
        assert_eq!(parse_vertex("D0", 9), None);
        assert_eq!(parse_vertex("D10", 9), None);
        assert_eq!(parse_vertex("Dx", 9), None);
    }

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("= D4\n"), "D4");
        assert_eq!(clean_response("=7 pass"), "pass");
        assert_eq!(clean_response("=\n"), "");
        assert_eq!(clean_response("? unknown command"), "");
    }

    #[test]
    fn test_name_command() {
        let mut server = GtpServer::new(9);
        let (success, response) = server.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "tengen");
    }

    #[test]
    fn test_protocol_version() {
        let mut server = GtpServer::new(9);
        let (success, response) = server.execute("protocol_version", &[]);
        assert!(success);
        assert_eq!(response, "2");
    }

    #[test]
    fn test_known_command() {
        let mut server = GtpServer::new(9);

        let (success, response) = server.execute("known_command", &["undo"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = server.execute("known_command", &["unknown_cmd"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_boardsize() {
        let mut server = GtpServer::new(9);

        let (success, _) = server.execute("boardsize", &["13"]);
        assert!(success);
        assert_eq!(server.game.size(), 13);

        let (success, _) = server.execute("boardsize", &["10"]);
        assert!(!success);

        let (success, _) = server.execute("boardsize", &["x"]);
        assert!(!success);
    }

    #[test]
    fn test_play_and_clear() {
        let mut server = GtpServer::new(9);

        let (success, _) = server.execute("play", &["black", "D4"]);
        assert!(success);
        assert_eq!(server.game.stone_at(3, 5), Stone::Black);

        let (success, _) = server.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(server.game.board().stone_counts(), (0, 0));
    }

    #[test]
    fn test_play_rejects_occupied_vertex() {
        let mut server = GtpServer::new(9);

        let (success, _) = server.execute("play", &["b", "E5"]);
        assert!(success);
        let (success, message) = server.execute("play", &["w", "E5"]);
        assert!(!success);
        assert!(!message.is_empty());
    }

    #[test]
    fn test_off_turn_play_hands_over_with_a_pass() {
        let mut server = GtpServer::new(9);

        // White moves first even though Black is to play.
        let (success, _) = server.execute("play", &["white", "C3"]);
        assert!(success);
        assert_eq!(server.game.stone_at(2, 6), Stone::White);
        assert!(server.game.black_to_move());
    }

    #[test]
    fn test_genmove_opens_center_and_plays_it() {
        let mut server = GtpServer::new(9);

        let (success, response) = server.execute("genmove", &["black"]);
        assert!(success);
        assert_eq!(response, "E5");
        assert_eq!(server.game.stone_at(4, 4), Stone::Black);
        assert!(!server.game.black_to_move());
    }

    #[test]
    fn test_undo_command() {
        let mut server = GtpServer::new(9);

        let (success, _) = server.execute("undo", &[]);
        assert!(!success, "nothing to undo on a fresh board");

        server.execute("play", &["b", "D4"]);
        let (success, _) = server.execute("undo", &[]);
        assert!(success);
        assert_eq!(server.game.stone_at(3, 5), Stone::Empty);
        assert!(server.game.black_to_move());
    }
}
