use rand::Rng;

/// Conway's B3/S23 rule.
///
/// A live cell survives with two or three live neighbours; a dead cell is
/// born with exactly three.
pub fn next_state(alive: bool, live_neighbours: u8) -> bool {
    matches!((alive, live_neighbours), (true, 2) | (_, 3))
}

/// Fixed-size Game of Life grid without wrap-around.
///
/// Cells are stored row-major. Generations are computed into a scratch
/// buffer and swapped in, so every cell sees the same previous generation.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
    scratch: Vec<bool>,
    generation: u64,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
            scratch: vec![false; rows * cols],
            generation: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fills every cell independently: alive with probability `density`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R, density: f64) {
        let density = density.clamp(0.0, 1.0);
        for cell in &mut self.cells {
            *cell = rng.gen_bool(density);
        }
        self.generation = 0;
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
        self.generation = 0;
    }

    /// Out-of-range cells read as dead.
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.index(row, col).is_some_and(|i| self.cells[i])
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = alive;
        }
    }

    /// Flips a cell and returns its new state; `None` when out of range.
    pub fn toggle(&mut self, row: usize, col: usize) -> Option<bool> {
        let i = self.index(row, col)?;
        self.cells[i] = !self.cells[i];
        Some(self.cells[i])
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Live cells among the eight neighbours; edges have fewer neighbours.
    pub fn live_neighbours(&self, row: usize, col: usize) -> u8 {
        let mut live = 0;
        for dr in [-1isize, 0, 1] {
            for dc in [-1isize, 0, 1] {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (Some(r), Some(c)) = (row.checked_add_signed(dr), col.checked_add_signed(dc))
                else {
                    continue;
                };
                if self.is_alive(r, c) {
                    live += 1;
                }
            }
        }
        live
    }

    /// Advances one generation.
    pub fn step(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let alive = self.cells[row * self.cols + col];
                self.scratch[row * self.cols + col] =
                    next_state(alive, self.live_neighbours(row, col));
            }
        }
        std::mem::swap(&mut self.cells, &mut self.scratch);
        self.generation += 1;
    }

    /// Cells in row-major order as `(row, col, alive)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, alive)| (i / self.cols, i % self.cols, *alive))
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}
