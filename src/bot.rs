//! The opponent contract shared by the local search AI and the external
//! engine bridge.
//!
//! Opponents keep an internal mirror of the game position. Every method
//! takes `&self` with interior mutability so one opponent can be shared
//! behind an `Arc` between the interactive thread and worker threads.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::board::{Board, Point, Stone};
use crate::constants::{THINK_TIME_EASY_SECS, THINK_TIME_HARD_SECS, THINK_TIME_MEDIUM_SECS};

/// Lock a mutex, recovering the guard when a worker panicked while
/// holding it.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("opponent state mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// A move decided by an opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMove {
    Play(Point),
    Pass,
    Resign,
}

/// Requested opponent strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Per-move think time granted to the external engine.
    pub fn think_time_secs(self) -> u32 {
        match self {
            Difficulty::Easy => THINK_TIME_EASY_SECS,
            Difficulty::Medium => THINK_TIME_MEDIUM_SECS,
            Difficulty::Hard => THINK_TIME_HARD_SECS,
        }
    }

    /// Numeric form used in save files: 1, 2 or 3.
    pub fn index(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_index(index: u32) -> Option<Difficulty> {
        match index {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        write!(f, "{s}")
    }
}

/// An opponent the orchestrator can play against.
///
/// Implementations must keep their internal mirror convergent with the
/// authoritative board: after every applied move is forwarded through
/// [`Bot::sync_move`], the mirror shows the same stones, captures included.
pub trait Bot: Send + Sync {
    /// Prepare for a fresh or resumed game. May block on process startup.
    fn init(&self);

    /// Mirror a move this opponent did not generate.
    fn sync_move(&self, color: Stone, x: usize, y: usize);

    /// Decide a move for the side given by `black_to_move`.
    fn generate_move(&self, black_to_move: bool) -> BotMove;

    /// Stones this opponent estimates to be dead at game end. Opponents
    /// with no estimation ability report none.
    fn dead_stones(&self) -> Vec<Point> {
        Vec::new()
    }

    /// Reconfigure for a new board size, clearing the mirror.
    fn set_board_size(&self, size: usize);

    /// Whether [`Bot::generate_move`] already applied the move to this
    /// opponent's own mirror. When false the orchestrator must forward
    /// generated moves back through [`Bot::sync_move`].
    fn applies_own_moves(&self) -> bool {
        false
    }

    /// Replace the mirror with `board`, replaying its stones row-major.
    ///
    /// Used after undo, redo, or loading a saved game. Implementations
    /// holding a conversation lock should override this to keep the whole
    /// replay in one conversation.
    fn load_board(&self, board: &Board) {
        self.set_board_size(board.size());
        for (x, y) in board.iter_points() {
            let stone = board.get(x, y);
            if stone.is_stone() {
                self.sync_move(stone, x, y);
            }
        }
    }
}
