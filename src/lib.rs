//! Tengen: a Go engine with full rules, scoring, and pluggable opponents.
//!
//! The crate is built around a plain rules engine ([`game::Game`]) and a
//! [`bot::Bot`] trait with two implementations: an in-process minimax
//! searcher and a bridge to an external GTP engine such as Pachi. A
//! manager owns the opponents and runs their protocol traffic on worker
//! threads, so a caller (typically a UI loop) never blocks on a child
//! process.
//!
//! ## Modules
//!
//! - [`constants`] - Board sizes, search weights, protocol timeouts
//! - [`board`] - Grid state, groups, and liberty counting
//! - [`game`] - Move legality, captures, ko, pass, undo/redo
//! - [`territory`] - Territory flood-fill and area scoring
//! - [`save`] - Plain-text save files
//! - [`bot`] - The opponent interface and difficulty levels
//! - [`minimax`] - Local alpha-beta opponent
//! - [`gtp`] - GTP coordinate helpers and the built-in GTP server
//! - [`bridge`] - Child-process client for external GTP engines
//! - [`manager`] - Opponent lifecycle and the background analysis engine
//!
//! ## Example
//!
//! ```
//! use tengen::game::Game;
//! use tengen::territory;
//!
//! // Create a new game and play a few moves
//! let mut game = Game::new(9);
//! game.attempt_move(2, 2).unwrap(); // Black
//! game.attempt_move(6, 6).unwrap(); // White
//!
//! // Score the position as it stands
//! let summary = territory::score(game.board(), &[], game.komi());
//! println!("B {} - W {}", summary.black_total(), summary.white_total());
//! ```

pub mod board;
pub mod bot;
pub mod bridge;
pub mod constants;
pub mod game;
pub mod gtp;
pub mod manager;
pub mod minimax;
pub mod save;
pub mod territory;
