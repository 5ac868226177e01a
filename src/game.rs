//! Rules engine: move legality, captures, ko, passes, and undo/redo.
//!
//! This module owns the authoritative game state:
//! - Stone placement with capture resolution
//! - Suicide rejection (board left byte-identical, no history entry)
//! - Single-point ko bookkeeping
//! - Pass handling and the two-consecutive-passes game end
//! - Snapshot-based undo/redo with redo-branch discard

use thiserror::Error;

use crate::board::{Board, Point, Stone};
use crate::constants::DEFAULT_KOMI;

/// Why a move was rejected. No state is mutated when a move errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("point is outside the board")]
    OutOfBounds,
    #[error("point is already occupied")]
    Occupied,
    #[error("ko rule forbids immediate recapture")]
    KoViolation,
    #[error("suicide is not allowed")]
    Suicide,
}

/// What a successful move did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Stones removed from the board by this move.
    pub captured: Vec<Point>,
    /// True when this action ended the game (second consecutive pass).
    pub game_over: bool,
}

/// Everything needed to restore a position exactly.
#[derive(Clone)]
struct Snapshot {
    board: Board,
    black_to_move: bool,
    ko: Option<Point>,
    last_move_passed: bool,
    game_over: bool,
}

/// A game in progress.
pub struct Game {
    board: Board,
    black_to_move: bool,
    ko: Option<Point>,
    last_move_passed: bool,
    game_over: bool,
    komi: f32,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Game {
    pub fn new(size: usize) -> Self {
        Self {
            board: Board::new(size),
            black_to_move: true,
            ko: None,
            last_move_passed: false,
            game_over: false,
            komi: DEFAULT_KOMI,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Reset to an empty board of the same size. Clears both history stacks.
    pub fn new_game(&mut self) {
        let size = self.board.size();
        self.set_size(size);
    }

    /// Replace the board with an empty one of `size` and reset all state.
    pub fn set_size(&mut self, size: usize) {
        self.board = Board::new(size);
        self.black_to_move = true;
        self.ko = None;
        self.last_move_passed = false;
        self.game_over = false;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Try to place a stone for the side to move.
    ///
    /// On success the board reflects the placement and any captures, the
    /// ko point is updated, and the turn flips. On error nothing changed
    /// and no history entry was recorded.
    ///
    /// # Errors
    /// - [`MoveError::OutOfBounds`] / [`MoveError::Occupied`] for an
    ///   unplayable point
    /// - [`MoveError::KoViolation`] when the point is the current ko point
    /// - [`MoveError::Suicide`] when the placed group would have no
    ///   liberties and nothing is captured
    pub fn attempt_move(&mut self, x: usize, y: usize) -> Result<MoveOutcome, MoveError> {
        if !self.board.in_bounds(x, y) {
            return Err(MoveError::OutOfBounds);
        }
        if self.board.get(x, y) != Stone::Empty {
            return Err(MoveError::Occupied);
        }
        if self.ko == Some((x, y)) {
            return Err(MoveError::KoViolation);
        }

        let player = self.current_stone();
        let snapshot = self.snapshot();

        self.board.set(x, y, player);
        if self.is_suicide(x, y, player) {
            self.board.set(x, y, Stone::Empty);
            return Err(MoveError::Suicide);
        }

        self.undo_stack.push(snapshot);
        self.redo_stack.clear();

        let captured = self.remove_captures(x, y, player);

        // A single captured stone opens a ko at its point; anything else
        // clears the ko.
        self.ko = if captured.len() == 1 {
            Some(captured[0])
        } else {
            None
        };

        self.last_move_passed = false;
        self.black_to_move = !self.black_to_move;

        Ok(MoveOutcome {
            captured,
            game_over: false,
        })
    }

    /// Pass the turn. Always succeeds and always records a history entry.
    ///
    /// The second consecutive pass ends the game. The ko point is left
    /// untouched; only stone placement updates it.
    pub fn attempt_pass(&mut self) -> MoveOutcome {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();

        let ended = self.last_move_passed;
        if ended {
            self.game_over = true;
        }

        self.last_move_passed = true;
        self.black_to_move = !self.black_to_move;

        MoveOutcome {
            captured: Vec::new(),
            game_over: ended,
        }
    }

    /// Restore the previous position. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(prev);
        true
    }

    /// Re-apply the most recently undone action. Returns false when there
    /// is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.snapshot());
        self.restore(next);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Stone at `(x, y)`; `Empty` for out-of-bounds points.
    pub fn stone_at(&self, x: usize, y: usize) -> Stone {
        self.board.get(x, y)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn black_to_move(&self) -> bool {
        self.black_to_move
    }

    /// Color of the side to move.
    pub fn current_stone(&self) -> Stone {
        if self.black_to_move {
            Stone::Black
        } else {
            Stone::White
        }
    }

    pub fn ko(&self) -> Option<Point> {
        self.ko
    }

    /// Whether the previous action was a pass.
    pub fn last_move_passed(&self) -> bool {
        self.last_move_passed
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn set_komi(&mut self, komi: f32) {
        self.komi = komi;
    }

    /// Install a position read from a save file. Clears both history
    /// stacks; saved games do not carry history.
    pub(crate) fn restore_loaded(
        &mut self,
        board: Board,
        black_to_move: bool,
        ko: Option<Point>,
        last_move_passed: bool,
        game_over: bool,
    ) {
        self.board = board;
        self.black_to_move = black_to_move;
        self.ko = ko;
        self.last_move_passed = last_move_passed;
        self.game_over = game_over;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            black_to_move: self.black_to_move,
            ko: self.ko,
            last_move_passed: self.last_move_passed,
            game_over: self.game_over,
        }
    }

    fn restore(&mut self, snap: Snapshot) {
        self.board = snap.board;
        self.black_to_move = snap.black_to_move;
        self.ko = snap.ko;
        self.last_move_passed = snap.last_move_passed;
        self.game_over = snap.game_over;
    }

    /// Suicide test for a stone already placed at `(x, y)`: the placed
    /// group has no liberties and no adjacent enemy group is captured.
    fn is_suicide(&self, x: usize, y: usize, player: Stone) -> bool {
        if self.board.group_liberties(x, y) > 0 {
            return false;
        }
        let enemy = player.opponent();
        for (nx, ny) in self.board.neighbors(x, y) {
            if self.board.get(nx, ny) == enemy && self.board.group_liberties(nx, ny) == 0 {
                return false;
            }
        }
        true
    }

    /// Remove every adjacent enemy group left without liberties by the
    /// stone placed at `(x, y)`. Returns the removed points.
    fn remove_captures(&mut self, x: usize, y: usize, player: Stone) -> Vec<Point> {
        let enemy = player.opponent();
        let mut captured = Vec::new();
        for (nx, ny) in self.board.neighbors(x, y) {
            if self.board.get(nx, ny) == enemy && self.board.group_liberties(nx, ny) == 0 {
                for (gx, gy) in self.board.collect_group(nx, ny) {
                    self.board.set(gx, gy, Stone::Empty);
                    captured.push((gx, gy));
                }
            }
        }
        captured
    }
}
