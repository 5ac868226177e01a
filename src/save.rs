//! Plain-text save files.
//!
//! A save is three sections in one file:
//!
//! 1. a pipe-delimited header line with the metadata shown in a save
//!    browser (title, timestamp, board size, mode, status, difficulty,
//!    end reason),
//! 2. a space-delimited state line `size turn koX koY pass timeB timeW`,
//! 3. one row of the board per line, `0` empty / `1` black / `2` white.
//!
//! History is not persisted; loading starts both undo stacks empty.
//! Newlines inside the end reason are stored as `~` so the header stays
//! a single line.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::board::{Board, Point, Stone};
use crate::bot::Difficulty;
use crate::constants::SUPPORTED_SIZES;
use crate::game::Game;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("malformed save file: {0}")]
    Malformed(String),
}

/// Who is playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    PlayerVsPlayer,
    PlayerVsAi,
}

impl GameMode {
    fn as_str(self) -> &'static str {
        match self {
            GameMode::PlayerVsPlayer => "PvP",
            GameMode::PlayerVsAi => "PvAI",
        }
    }

    fn parse(s: &str) -> Self {
        if s == "PvAI" {
            GameMode::PlayerVsAi
        } else {
            GameMode::PlayerVsPlayer
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the saved game had already finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Finished,
}

impl GameStatus {
    fn as_str(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "Ongoing",
            GameStatus::Finished => "Finished",
        }
    }

    fn parse(s: &str) -> Self {
        if s == "Finished" {
            GameStatus::Finished
        } else {
            GameStatus::Ongoing
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header metadata carried alongside the board state.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveInfo {
    pub title: String,
    pub timestamp: String,
    pub board_size: usize,
    pub mode: GameMode,
    pub status: GameStatus,
    pub difficulty: Difficulty,
    /// Free text describing how the game ended; empty while ongoing.
    pub end_reason: String,
}

/// Everything a loaded file yields besides the game state itself.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGame {
    pub info: SaveInfo,
    pub time_black: f32,
    pub time_white: f32,
}

/// Write the game and its metadata to `path`.
pub fn save_game(
    path: &Path,
    game: &Game,
    info: &SaveInfo,
    time_black: f32,
    time_white: f32,
) -> Result<(), SaveError> {
    let mut out = String::new();

    let safe_reason = info.end_reason.replace('\n', "~");
    out.push_str(&format!(
        "{}|{}|{}|{}|{}|{}|{}\n",
        info.title,
        info.timestamp,
        info.board_size,
        info.mode,
        info.status,
        info.difficulty.index(),
        safe_reason
    ));

    let (ko_x, ko_y) = match game.ko() {
        Some((x, y)) => (x as i32, y as i32),
        None => (-1, -1),
    };
    out.push_str(&format!(
        "{} {} {} {} {} {} {}\n",
        game.size(),
        if game.black_to_move() { 1 } else { 0 },
        ko_x,
        ko_y,
        if game.last_move_passed() { 1 } else { 0 },
        time_black,
        time_white
    ));

    for y in 0..game.size() {
        for x in 0..game.size() {
            let val = match game.stone_at(x, y) {
                Stone::Empty => 0,
                Stone::Black => 1,
                Stone::White => 2,
            };
            out.push_str(&format!("{val} "));
        }
        out.push('\n');
    }

    fs::write(path, out)?;
    log::info!("saved game to {}", path.display());
    Ok(())
}

/// Read just the header of a save file, for listing saves without
/// loading their boards.
pub fn read_save_info(path: &Path) -> Result<SaveInfo, SaveError> {
    let content = fs::read_to_string(path)?;
    let header = content
        .lines()
        .next()
        .ok_or_else(|| SaveError::Malformed("empty file".to_string()))?;
    parse_header(header)
}

/// Load a save file into `game`, replacing its board, turn, ko state and
/// history. The game is left untouched when the file does not parse.
pub fn load_game(path: &Path, game: &mut Game) -> Result<LoadedGame, SaveError> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    let header = lines
        .next()
        .ok_or_else(|| SaveError::Malformed("empty file".to_string()))?;
    let info = parse_header(header)?;

    let state_line = lines
        .next()
        .ok_or_else(|| SaveError::Malformed("missing state line".to_string()))?;
    let mut state = state_line.split_whitespace();
    let size: usize = next_field(&mut state, "board size")?;
    let turn: i32 = next_field(&mut state, "turn flag")?;
    let ko_x: i32 = next_field(&mut state, "ko x")?;
    let ko_y: i32 = next_field(&mut state, "ko y")?;
    let pass: i32 = next_field(&mut state, "pass flag")?;
    let time_black: f32 = next_field(&mut state, "black time")?;
    let time_white: f32 = next_field(&mut state, "white time")?;

    if !SUPPORTED_SIZES.contains(&size) {
        return Err(SaveError::Malformed(format!("unsupported board size {size}")));
    }

    let mut board = Board::new(size);
    let mut cells = lines.flat_map(str::split_whitespace);
    for y in 0..size {
        for x in 0..size {
            let token = cells
                .next()
                .ok_or_else(|| SaveError::Malformed("truncated board".to_string()))?;
            let stone = match token {
                "0" => Stone::Empty,
                "1" => Stone::Black,
                "2" => Stone::White,
                other => {
                    return Err(SaveError::Malformed(format!("bad cell value '{other}'")));
                }
            };
            board.set(x, y, stone);
        }
    }

    let ko = parse_ko(ko_x, ko_y, size)?;

    game.restore_loaded(
        board,
        turn == 1,
        ko,
        pass == 1,
        info.status == GameStatus::Finished,
    );
    log::info!("loaded game from {}", path.display());

    Ok(LoadedGame {
        info,
        time_black,
        time_white,
    })
}

fn parse_header(header: &str) -> Result<SaveInfo, SaveError> {
    let parts: Vec<&str> = header.split('|').collect();
    // Older saves stop after the status field.
    if parts.len() < 5 {
        return Err(SaveError::Malformed(format!(
            "header has {} fields, expected at least 5",
            parts.len()
        )));
    }

    let board_size: usize = parts[2]
        .parse()
        .map_err(|_| SaveError::Malformed(format!("bad board size '{}'", parts[2])))?;

    let difficulty = parts
        .get(5)
        .and_then(|v| v.parse::<u32>().ok())
        .and_then(Difficulty::from_index)
        .unwrap_or(Difficulty::Easy);

    let end_reason = parts
        .get(6)
        .map(|v| v.trim_end().replace('~', "\n"))
        .unwrap_or_default();

    Ok(SaveInfo {
        title: parts[0].to_string(),
        timestamp: parts[1].to_string(),
        board_size,
        mode: GameMode::parse(parts[3]),
        status: GameStatus::parse(parts[4]),
        difficulty,
        end_reason,
    })
}

fn next_field<'a, I, T>(fields: &mut I, what: &str) -> Result<T, SaveError>
where
    I: Iterator<Item = &'a str>,
    T: std::str::FromStr,
{
    fields
        .next()
        .ok_or_else(|| SaveError::Malformed(format!("missing {what}")))?
        .parse()
        .map_err(|_| SaveError::Malformed(format!("bad {what}")))
}

fn parse_ko(ko_x: i32, ko_y: i32, size: usize) -> Result<Option<Point>, SaveError> {
    if ko_x < 0 || ko_y < 0 {
        return Ok(None);
    }
    let (x, y) = (ko_x as usize, ko_y as usize);
    if x >= size || y >= size {
        return Err(SaveError::Malformed(format!("ko point ({ko_x},{ko_y}) off board")));
    }
    Ok(Some((x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("tengen-save-test-{}-{name}.txt", std::process::id()));
        path
    }

    fn sample_info(size: usize) -> SaveInfo {
        SaveInfo {
            title: "Game 1".to_string(),
            timestamp: "2025-01-05 11:30".to_string(),
            board_size: size,
            mode: GameMode::PlayerVsAi,
            status: GameStatus::Ongoing,
            difficulty: Difficulty::Medium,
            end_reason: String::new(),
        }
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let path = temp_path("round-trip");

        let mut game = Game::new(9);
        game.attempt_move(2, 2).unwrap();
        game.attempt_move(6, 6).unwrap();
        game.attempt_move(3, 2).unwrap();
        save_game(&path, &game, &sample_info(9), 120.5, 95.0).unwrap();

        let mut loaded = Game::new(19);
        let result = load_game(&path, &mut loaded).unwrap();

        assert_eq!(loaded.size(), 9);
        assert_eq!(loaded.board(), game.board());
        assert_eq!(loaded.black_to_move(), game.black_to_move());
        assert_eq!(loaded.ko(), game.ko());
        assert!(!loaded.is_over());
        assert!(!loaded.can_undo(), "history is not persisted");
        assert!(!loaded.can_redo());

        assert_eq!(result.info, sample_info(9));
        assert_eq!(result.time_black, 120.5);
        assert_eq!(result.time_white, 95.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_end_reason_newlines_survive() {
        let path = temp_path("end-reason");

        let game = Game::new(9);
        let mut info = sample_info(9);
        info.status = GameStatus::Finished;
        info.end_reason = "Time Out!\nWhite Wins!".to_string();
        save_game(&path, &game, &info, 0.0, 0.0).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.contains("Time Out!~White Wins!"));
        // The escaped newline kept the header to one line.
        assert!(content.lines().nth(1).unwrap().starts_with("9 "));

        let mut loaded = Game::new(9);
        let result = load_game(&path, &mut loaded).unwrap();
        assert_eq!(result.info.end_reason, "Time Out!\nWhite Wins!");
        assert!(loaded.is_over());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_header_peek_without_board() {
        let path = temp_path("peek");

        let game = Game::new(13);
        save_game(&path, &game, &sample_info(13), 0.0, 0.0).unwrap();
        let info = read_save_info(&path).unwrap();
        assert_eq!(info.board_size, 13);
        assert_eq!(info.mode, GameMode::PlayerVsAi);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_short_header_defaults_difficulty() {
        let path = temp_path("short-header");
        std::fs::write(
            &path,
            "Old Game|2024-11-02 09:00|9|PvP|Ongoing\n\
             9 1 -1 -1 0 0 0\n\
             0 0 0 0 0 0 0 0 0\n0 0 0 0 0 0 0 0 0\n0 0 0 0 0 0 0 0 0\n\
             0 0 0 0 0 0 0 0 0\n0 0 0 0 0 0 0 0 0\n0 0 0 0 0 0 0 0 0\n\
             0 0 0 0 0 0 0 0 0\n0 0 0 0 0 0 0 0 0\n0 0 0 0 0 0 0 0 0\n",
        )
        .unwrap();

        let mut game = Game::new(9);
        let result = load_game(&path, &mut game).unwrap();
        assert_eq!(result.info.difficulty, Difficulty::Easy);
        assert_eq!(result.info.mode, GameMode::PlayerVsPlayer);
        assert_eq!(result.info.end_reason, "");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_leaves_game_untouched() {
        let path = temp_path("malformed");
        std::fs::write(&path, "A|B|9|PvP|Ongoing|1|\n9 1 -1 -1 0 0 0\n1 2 junk\n").unwrap();

        let mut game = Game::new(9);
        game.attempt_move(4, 4).unwrap();
        let before = game.board().clone();

        assert!(load_game(&path, &mut game).is_err());
        assert_eq!(game.board(), &before);
        assert!(!game.black_to_move());
        assert!(game.can_undo());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unsupported_size_rejected() {
        let path = temp_path("bad-size");
        std::fs::write(&path, "A|B|10|PvP|Ongoing|1|\n10 1 -1 -1 0 0 0\n").unwrap();

        let mut game = Game::new(9);
        match load_game(&path, &mut game) {
            Err(SaveError::Malformed(msg)) => assert!(msg.contains("unsupported")),
            other => panic!("expected malformed error, got {other:?}"),
        }

        let _ = std::fs::remove_file(&path);
    }
}
