//! Board grid, stones, and group/liberty flood fill.

use std::fmt;

/// Contents of one board point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stone {
    Empty,
    Black,
    White,
}

impl Stone {
    /// The opposing color. `Empty` has no opponent and maps to itself.
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            Stone::Empty => Stone::Empty,
        }
    }

    pub fn is_stone(self) -> bool {
        self != Stone::Empty
    }
}

/// A board coordinate as `(x, y)`, with `x` the column and `y` the row,
/// both counted from the top-left corner.
pub type Point = (usize, usize);

/// A square Go board of runtime size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Stone>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Stone::Empty; size * size],
        }
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    /// Stone at `(x, y)`. Out-of-bounds points read as `Empty`.
    pub fn get(&self, x: usize, y: usize) -> Stone {
        if !self.in_bounds(x, y) {
            return Stone::Empty;
        }
        self.cells[self.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, stone: Stone) {
        if self.in_bounds(x, y) {
            let i = self.idx(x, y);
            self.cells[i] = stone;
        }
    }

    /// Orthogonal neighbors of `(x, y)`, filtered to the board.
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<Point> {
        let mut v = Vec::with_capacity(4);
        if x > 0 {
            v.push((x - 1, y));
        }
        if x + 1 < self.size {
            v.push((x + 1, y));
        }
        if y > 0 {
            v.push((x, y - 1));
        }
        if y + 1 < self.size {
            v.push((x, y + 1));
        }
        v
    }

    /// All points in row-major order.
    pub fn iter_points(&self) -> impl Iterator<Item = Point> + '_ {
        let s = self.size;
        (0..s).flat_map(move |y| (0..s).map(move |x| (x, y)))
    }

    /// Number of black and white stones on the board.
    pub fn stone_counts(&self) -> (usize, usize) {
        let mut black = 0;
        let mut white = 0;
        for &c in &self.cells {
            match c {
                Stone::Black => black += 1,
                Stone::White => white += 1,
                Stone::Empty => {}
            }
        }
        (black, white)
    }

    /// Collect all stones of the group containing `(x, y)`.
    ///
    /// Flood fill with an explicit work stack and a pre-sized visited array.
    /// Returns an empty vector for an empty or out-of-bounds point.
    pub fn collect_group(&self, x: usize, y: usize) -> Vec<Point> {
        let color = self.get(x, y);
        if !color.is_stone() {
            return Vec::new();
        }

        let mut group = Vec::new();
        let mut stack = vec![(x, y)];
        let mut visited = vec![false; self.size * self.size];

        while let Some((cx, cy)) = stack.pop() {
            let i = self.idx(cx, cy);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            group.push((cx, cy));
            for (nx, ny) in self.neighbors(cx, cy) {
                if self.get(nx, ny) == color && !visited[self.idx(nx, ny)] {
                    stack.push((nx, ny));
                }
            }
        }
        group
    }

    /// Count the liberties of the group containing `(x, y)`.
    ///
    /// Tracks visited stones and visited liberty points separately so a
    /// liberty shared by several stones of the group counts exactly once.
    pub fn group_liberties(&self, x: usize, y: usize) -> usize {
        let color = self.get(x, y);
        if !color.is_stone() {
            return 0;
        }

        let mut stack = vec![(x, y)];
        let mut visited = vec![false; self.size * self.size];
        let mut liberty_visited = vec![false; self.size * self.size];
        let mut libs = 0;

        while let Some((cx, cy)) = stack.pop() {
            let i = self.idx(cx, cy);
            if visited[i] {
                continue;
            }
            visited[i] = true;

            for (nx, ny) in self.neighbors(cx, cy) {
                let ni = self.idx(nx, ny);
                match self.get(nx, ny) {
                    Stone::Empty => {
                        if !liberty_visited[ni] {
                            liberty_visited[ni] = true;
                            libs += 1;
                        }
                    }
                    c if c == color && !visited[ni] => stack.push((nx, ny)),
                    _ => {}
                }
            }
        }
        libs
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let ch = match self.get(x, y) {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    Stone::Empty => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
