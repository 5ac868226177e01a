//! Local search AI: depth-limited minimax with alpha-beta pruning.
//!
//! Candidate moves are restricted to empty points within one cell of an
//! existing stone, which keeps the branching factor workable on a full
//! board. Leaf positions are scored with a liberty-based heuristic that
//! punishes own groups in atari and rewards putting enemy groups there;
//! capturing candidates get a large bonus at the root so captures win
//! among otherwise equal moves.

use std::sync::Mutex;

use crate::board::{Board, Point, Stone};
use crate::bot::{lock_or_recover, Bot, BotMove};
use crate::constants::{
    CAPTURE_BONUS, ENEMY_ATARI_BONUS, ENEMY_STONE_SCORE, OWN_ATARI_PENALTY, OWN_STONE_SCORE,
    SCORE_INF, STRONG_GROUP_BONUS, STRONG_GROUP_LIBS, TIE_BREAK_PERCENT,
};

/// Minimax opponent holding its own mirror of the game board.
pub struct MinimaxBot {
    mirror: Mutex<Board>,
    depth: usize,
}

impl MinimaxBot {
    pub fn new(size: usize, depth: usize) -> Self {
        Self {
            mirror: Mutex::new(Board::new(size)),
            depth,
        }
    }

    /// Replace the mirror wholesale. Handy when driving the searcher from
    /// an authoritative position instead of a synced move stream.
    pub fn set_position(&self, board: &Board) {
        *lock_or_recover(&self.mirror) = board.clone();
    }

    /// A copy of the internal mirror.
    pub fn position(&self) -> Board {
        lock_or_recover(&self.mirror).clone()
    }

    fn pick_move(&self, board: &mut Board, my: Stone) -> BotMove {
        let candidates = candidate_moves(board, my);

        if candidates.is_empty() {
            // Nothing near a stone; open at the center if it is free.
            let c = board.size() / 2;
            if board.get(c, c) == Stone::Empty {
                return BotMove::Play((c, c));
            }
            return BotMove::Pass;
        }

        let mut best: Option<Point> = None;
        let mut best_val = -SCORE_INF;
        let mut alpha = -SCORE_INF;
        let beta = SCORE_INF;

        for &(x, y) in &candidates {
            if !is_legal(board, x, y, my) {
                continue;
            }

            let backup = board.clone();
            let capture_bonus = apply_move(board, x, y, my) as i32 * CAPTURE_BONUS;
            let val = search(board, self.depth.saturating_sub(1), false, my, alpha, beta)
                + capture_bonus;
            *board = backup;

            if val > best_val {
                best_val = val;
                best = Some((x, y));
            } else if val == best_val && fastrand::u32(..100) < TIE_BREAK_PERCENT {
                best = Some((x, y));
            }
            alpha = alpha.max(best_val);
        }

        match best {
            Some(p) => BotMove::Play(p),
            None => BotMove::Pass,
        }
    }
}

impl Bot for MinimaxBot {
    fn init(&self) {
        let mut mirror = lock_or_recover(&self.mirror);
        *mirror = Board::new(mirror.size());
    }

    fn sync_move(&self, color: Stone, x: usize, y: usize) {
        let mut mirror = lock_or_recover(&self.mirror);
        if mirror.in_bounds(x, y) && mirror.get(x, y) == Stone::Empty {
            apply_move(&mut mirror, x, y, color);
        }
    }

    fn generate_move(&self, black_to_move: bool) -> BotMove {
        let my = if black_to_move {
            Stone::Black
        } else {
            Stone::White
        };
        let mut mirror = lock_or_recover(&self.mirror);
        let mut scratch = mirror.clone();
        let mv = self.pick_move(&mut scratch, my);
        drop(mirror);
        mv
    }

    fn set_board_size(&self, size: usize) {
        *lock_or_recover(&self.mirror) = Board::new(size);
    }
}

/// Empty points within one cell (including diagonals) of any stone, kept
/// only when legal for `my`. Deduplicated with a marker array.
fn candidate_moves(board: &mut Board, my: Stone) -> Vec<Point> {
    let size = board.size();
    let mut marked = vec![false; size * size];
    let mut moves = Vec::new();

    for sy in 0..size {
        for sx in 0..size {
            if board.get(sx, sy) == Stone::Empty {
                continue;
            }
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = sx as i32 + dx;
                    let ny = sy as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= size as i32 || ny >= size as i32 {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if board.get(nx, ny) != Stone::Empty || marked[ny * size + nx] {
                        continue;
                    }
                    if is_legal(board, nx, ny, my) {
                        marked[ny * size + nx] = true;
                        moves.push((nx, ny));
                    }
                }
            }
        }
    }
    moves
}

/// Capture-or-liberty legality for a tentative placement. Ignores ko;
/// the authoritative rules engine enforces that.
fn is_legal(board: &mut Board, x: usize, y: usize, my: Stone) -> bool {
    if !board.in_bounds(x, y) || board.get(x, y) != Stone::Empty {
        return false;
    }

    board.set(x, y, my);

    let enemy = my.opponent();
    let captures = board
        .neighbors(x, y)
        .into_iter()
        .any(|(nx, ny)| board.get(nx, ny) == enemy && board.group_liberties(nx, ny) == 0);
    let my_libs = board.group_liberties(x, y);

    board.set(x, y, Stone::Empty);

    captures || my_libs > 0
}

/// Place a stone and remove any adjacent enemy groups left without
/// liberties. Returns the number of captured stones.
fn apply_move(board: &mut Board, x: usize, y: usize, color: Stone) -> usize {
    board.set(x, y, color);

    let enemy = color.opponent();
    let mut captured = 0;
    for (nx, ny) in board.neighbors(x, y) {
        if board.get(nx, ny) == enemy && board.group_liberties(nx, ny) == 0 {
            for (gx, gy) in board.collect_group(nx, ny) {
                board.set(gx, gy, Stone::Empty);
                captured += 1;
            }
        }
    }
    captured
}

/// Static evaluation from `my`'s point of view, summed over every stone.
fn evaluate(board: &Board, my: Stone) -> i32 {
    let mut score = 0;
    for (x, y) in board.iter_points() {
        let stone = board.get(x, y);
        if !stone.is_stone() {
            continue;
        }
        let libs = board.group_liberties(x, y);
        if stone == my {
            score += OWN_STONE_SCORE;
            if libs == 1 {
                score -= OWN_ATARI_PENALTY;
            } else if libs >= STRONG_GROUP_LIBS {
                score += STRONG_GROUP_BONUS;
            }
        } else {
            score -= ENEMY_STONE_SCORE;
            if libs == 1 {
                score += ENEMY_ATARI_BONUS;
            }
        }
    }
    score
}

fn search(
    board: &mut Board,
    depth: usize,
    maximizing: bool,
    my: Stone,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    if depth == 0 {
        return evaluate(board, my);
    }

    let current = if maximizing { my } else { my.opponent() };
    let candidates = candidate_moves(board, current);
    if candidates.is_empty() {
        return evaluate(board, my);
    }

    if maximizing {
        let mut max_eval = -SCORE_INF;
        for &(x, y) in &candidates {
            if !is_legal(board, x, y, current) {
                continue;
            }
            let backup = board.clone();
            apply_move(board, x, y, current);
            let eval = search(board, depth - 1, false, my, alpha, beta);
            *board = backup;

            max_eval = max_eval.max(eval);
            alpha = alpha.max(eval);
            if beta <= alpha {
                break;
            }
        }
        max_eval
    } else {
        let mut min_eval = SCORE_INF;
        for &(x, y) in &candidates {
            if !is_legal(board, x, y, current) {
                continue;
            }
            let backup = board.clone();
            apply_move(board, x, y, current);
            let eval = search(board, depth - 1, true, my, alpha, beta);
            *board = backup;

            min_eval = min_eval.min(eval);
            beta = beta.min(eval);
            if beta <= alpha {
                break;
            }
        }
        min_eval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a board from stone lists.
    fn board_with(size: usize, black: &[Point], white: &[Point]) -> Board {
        let mut b = Board::new(size);
        for &(x, y) in black {
            b.set(x, y, Stone::Black);
        }
        for &(x, y) in white {
            b.set(x, y, Stone::White);
        }
        b
    }

    #[test]
    fn test_evaluate_counts_both_sides() {
        let b = board_with(9, &[(4, 0)], &[(0, 0)]);
        // Black edge stone: +10 (3 liberties, below the strong threshold).
        // White corner stone: -10, two liberties so no atari term.
        assert_eq!(evaluate(&b, Stone::Black), OWN_STONE_SCORE - ENEMY_STONE_SCORE);
    }

    #[test]
    fn test_evaluate_atari_weights() {
        // White at (0,0) reduced to one liberty by Black at (1,0).
        let b = board_with(9, &[(1, 0)], &[(0, 0)]);
        let black_view = evaluate(&b, Stone::Black);
        // Own stone 10, enemy stone -10 + 600 atari bonus.
        assert_eq!(
            black_view,
            OWN_STONE_SCORE - ENEMY_STONE_SCORE + ENEMY_ATARI_BONUS
        );
        // From White's side the same group is an own-group atari.
        let white_view = evaluate(&b, Stone::White);
        assert_eq!(
            white_view,
            OWN_STONE_SCORE - OWN_ATARI_PENALTY - ENEMY_STONE_SCORE
        );
    }

    #[test]
    fn test_shared_liberty_counted_once() {
        // Two connected black stones with a shared liberty between their
        // other neighbors must not double-count any point.
        let mut b = board_with(9, &[(2, 2), (3, 2)], &[]);
        assert_eq!(b.group_liberties(2, 2), 6);
        // Surround to exactly one shared liberty at (2,1).
        for &(x, y) in &[(1, 2), (4, 2), (2, 3), (3, 3), (3, 1)] {
            b.set(x, y, Stone::White);
        }
        assert_eq!(b.group_liberties(2, 2), 1);
    }

    #[test]
    fn test_apply_move_removes_captured_group() {
        let mut b = board_with(9, &[(0, 1), (1, 0), (2, 1)], &[(1, 1)]);
        let captured = apply_move(&mut b, 1, 2, Stone::Black);
        assert_eq!(captured, 1);
        assert_eq!(b.get(1, 1), Stone::Empty);
    }

    #[test]
    fn test_is_legal_rejects_suicide_but_allows_capture() {
        // Corner point (0,0) surrounded by White: suicide for Black.
        let mut b = board_with(9, &[], &[(1, 0), (0, 1)]);
        assert!(!is_legal(&mut b, 0, 0, Stone::Black));
        // The same point is legal for Black once it captures: White (0,1)
        // in atari after Black takes its outside liberties.
        let mut b = board_with(9, &[(1, 1), (0, 2), (1, 0)], &[(0, 1)]);
        assert!(is_legal(&mut b, 0, 0, Stone::Black));
    }

    #[test]
    fn test_empty_board_opens_center() {
        let bot = MinimaxBot::new(9, 1);
        assert_eq!(bot.generate_move(true), BotMove::Play((4, 4)));
    }

    #[test]
    fn test_sync_move_resolves_captures_on_mirror() {
        let bot = MinimaxBot::new(9, 1);
        bot.sync_move(Stone::White, 1, 1);
        bot.sync_move(Stone::Black, 0, 1);
        bot.sync_move(Stone::Black, 1, 0);
        bot.sync_move(Stone::Black, 2, 1);
        bot.sync_move(Stone::Black, 1, 2);
        // The surrounded white stone must be gone from the mirror.
        assert_eq!(bot.position().get(1, 1), Stone::Empty);
    }

    #[test]
    fn test_candidates_stay_near_stones() {
        let bot = MinimaxBot::new(9, 1);
        bot.sync_move(Stone::Black, 4, 4);
        match bot.generate_move(false) {
            BotMove::Play((x, y)) => {
                let dx = (x as i32 - 4).abs();
                let dy = (y as i32 - 4).abs();
                assert!(dx <= 1 && dy <= 1, "move ({x},{y}) not adjacent to (4,4)");
            }
            other => panic!("expected a placement, got {other:?}"),
        }
    }

    #[test]
    fn test_prefers_capture() {
        let bot = MinimaxBot::new(9, 1);
        // White pair at (1,1)-(1,2) with a single liberty at (1,3).
        let board = board_with(
            9,
            &[(0, 1), (0, 2), (1, 0), (2, 1), (2, 2)],
            &[(1, 1), (1, 2)],
        );
        bot.set_position(&board);
        assert_eq!(bot.generate_move(true), BotMove::Play((1, 3)));
    }

    #[test]
    fn test_passes_when_no_legal_candidate() {
        // Black owns the whole board except two one-point eyes; every
        // White candidate is suicide and the center is taken.
        let mut board = Board::new(9);
        for (x, y) in Board::new(9).iter_points() {
            board.set(x, y, Stone::Black);
        }
        board.set(0, 0, Stone::Empty);
        board.set(8, 8, Stone::Empty);

        let bot = MinimaxBot::new(9, 1);
        bot.set_position(&board);
        assert_eq!(bot.generate_move(false), BotMove::Pass);
    }
}
