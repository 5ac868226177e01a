//! Territory analysis and area scoring.
//!
//! Empty regions are discovered with a queue-based flood fill. A region
//! bordered by stones of a single color belongs to that color; a region
//! touching both colors (or neither) is neutral. Stones marked dead are
//! treated as empty, so their points fall to the surrounding territory.

use std::collections::VecDeque;

use crate::board::{Board, Point, Stone};

/// Who owns an empty region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TerritoryOwner {
    Black,
    White,
    Neutral,
}

/// A maximal connected region of empty points.
#[derive(Debug, Clone)]
pub struct TerritoryRegion {
    /// Points inside the region, including any dead stones counted as empty.
    pub points: Vec<Point>,
    /// Live boundary stones touching the region.
    pub borders: Vec<Point>,
    pub owner: TerritoryOwner,
}

/// Final score of a position, area style.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub black_stones: usize,
    pub white_stones: usize,
    pub black_territory: usize,
    pub white_territory: usize,
    pub komi: f32,
}

impl ScoreSummary {
    pub fn black_total(&self) -> f32 {
        (self.black_stones + self.black_territory) as f32
    }

    pub fn white_total(&self) -> f32 {
        (self.white_stones + self.white_territory) as f32 + self.komi
    }

    /// Black's lead in points; negative when White is ahead.
    pub fn margin(&self) -> f32 {
        self.black_total() - self.white_total()
    }
}

/// Partition the empty points of `board` into owned regions.
///
/// Stones listed in `dead` are treated as empty. The returned regions are
/// disjoint and together cover every empty-or-dead point exactly once.
pub fn territory_regions(board: &Board, dead: &[Point]) -> Vec<TerritoryRegion> {
    let size = board.size();
    let mut dead_mask = vec![false; size * size];
    for &(x, y) in dead {
        if board.in_bounds(x, y) {
            dead_mask[y * size + x] = true;
        }
    }

    let counts_as_empty =
        |x: usize, y: usize| board.get(x, y) == Stone::Empty || dead_mask[y * size + x];

    let mut visited = vec![false; size * size];
    let mut regions = Vec::new();

    for (sx, sy) in board.iter_points() {
        if visited[sy * size + sx] || !counts_as_empty(sx, sy) {
            continue;
        }

        let mut points = Vec::new();
        let mut borders = Vec::new();
        let mut border_seen = vec![false; size * size];
        let mut touches_black = false;
        let mut touches_white = false;

        let mut queue = VecDeque::new();
        queue.push_back((sx, sy));
        visited[sy * size + sx] = true;

        while let Some((cx, cy)) = queue.pop_front() {
            points.push((cx, cy));

            for (nx, ny) in board.neighbors(cx, cy) {
                let ni = ny * size + nx;
                if counts_as_empty(nx, ny) {
                    if !visited[ni] {
                        visited[ni] = true;
                        queue.push_back((nx, ny));
                    }
                    continue;
                }
                match board.get(nx, ny) {
                    Stone::Black => touches_black = true,
                    Stone::White => touches_white = true,
                    Stone::Empty => {}
                }
                if !border_seen[ni] {
                    border_seen[ni] = true;
                    borders.push((nx, ny));
                }
            }
        }

        let owner = match (touches_black, touches_white) {
            (true, false) => TerritoryOwner::Black,
            (false, true) => TerritoryOwner::White,
            _ => TerritoryOwner::Neutral,
        };

        regions.push(TerritoryRegion {
            points,
            borders,
            owner,
        });
    }

    regions
}

/// Per-point territory owner for the live board (no dead stones).
///
/// Indexed `y * size + x`; `None` marks points carrying a stone.
pub fn owner_map(board: &Board) -> Vec<Option<TerritoryOwner>> {
    let size = board.size();
    let mut map = vec![None; size * size];
    for region in territory_regions(board, &[]) {
        for (x, y) in region.points {
            map[y * size + x] = Some(region.owner);
        }
    }
    map
}

/// Score a finished position.
///
/// Dead stones are excluded from their owner's stone count; their points
/// count toward the surrounding territory instead.
pub fn score(board: &Board, dead: &[Point], komi: f32) -> ScoreSummary {
    let size = board.size();
    let mut dead_mask = vec![false; size * size];
    for &(x, y) in dead {
        if board.in_bounds(x, y) {
            dead_mask[y * size + x] = true;
        }
    }

    let mut black_stones = 0;
    let mut white_stones = 0;
    for (x, y) in board.iter_points() {
        if dead_mask[y * size + x] {
            continue;
        }
        match board.get(x, y) {
            Stone::Black => black_stones += 1,
            Stone::White => white_stones += 1,
            Stone::Empty => {}
        }
    }

    let mut black_territory = 0;
    let mut white_territory = 0;
    for region in territory_regions(board, dead) {
        match region.owner {
            TerritoryOwner::Black => black_territory += region.points.len(),
            TerritoryOwner::White => white_territory += region.points.len(),
            TerritoryOwner::Neutral => {}
        }
    }

    ScoreSummary {
        black_stones,
        white_stones,
        black_territory,
        white_territory,
        komi,
    }
}
