use crate::RuleSet;
use rand::{Rng, SeedableRng};
use std::fmt;

/// A square board of `size x size` cells, one byte per cell (0 dead, 1 alive).
///
/// Cells are stored in row-major order, so `(x, y)` lives at `x + y * size`.
/// There is no wraparound: anything outside `[0, size)` reads as dead.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Creates an all-dead grid.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Creates a grid where every cell is alive with probability 1/2.
    ///
    /// # Arguments
    ///
    /// * `size` - Side length of the grid.
    /// * `seed` - Optional seed for the random number generator.
    ///   If None, seeds from the OS.
    pub fn random(size: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => rand_chacha::ChaCha8Rng::seed_from_u64(seed),
            None => rand_chacha::ChaCha8Rng::from_os_rng(),
        };
        let mut cells = vec![0u8; size * size];
        rng.fill(&mut cells[..]);
        for cell in cells.iter_mut() {
            *cell &= 1;
        }
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.size && y < self.size).then(|| x + y * self.size)
    }

    /// Returns true iff `(x, y)` is inside the grid and alive.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i] != 0)
    }

    /// Sets the state of `(x, y)`. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = alive as u8;
        }
    }

    /// Flips `(x, y)` between alive and dead. Out-of-range coordinates are ignored.
    pub fn toggle(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] ^= 1;
        }
    }

    /// Kills every cell.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Number of alive cells.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Cells of row `y`, left to right.
    ///
    /// # Panics
    ///
    /// Panics if `y >= size`.
    pub(crate) fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.size..(y + 1) * self.size]
    }

    /// Disjoint mutable rows, top to bottom.
    pub(crate) fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, u8> {
        // `max(1)` keeps chunks_mut happy on a zero-sized grid
        self.cells.chunks_mut(self.size.max(1))
    }

    /// Index of the lowest row that has an alive cell, if any.
    pub fn last_alive_row(&self) -> Option<usize> {
        (0..self.size)
            .rev()
            .find(|&y| self.row(y).iter().any(|&c| c != 0))
    }

    /// Number of alive cells among the 8 neighbors of `(x, y)`.
    /// Neighbors outside the grid count as dead.
    pub fn neighbors(&self, x: usize, y: usize) -> u8 {
        let mut sum = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy))
                {
                    sum += self.get(nx, ny) as u8;
                }
            }
        }
        sum
    }

    /// State of `(x, y)` after one generation under `rule`.
    /// Depends only on this grid, never on cells already computed elsewhere.
    #[inline]
    pub fn next_state(&self, rule: &RuleSet, x: usize, y: usize) -> bool {
        rule.next_state(self.get(x, y), self.neighbors(x, y))
    }

    /// Fast 64-bit hash of the grid contents, for cheap board comparison.
    ///
    /// The hasher is seeded with constants, so the value is stable within a build.
    pub fn hash(&self) -> u64 {
        ahash::RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        )
        .hash_one((self.size, &self.cells))
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}", self.size, self.size)?;
        for y in 0..self.size {
            for &c in self.row(y) {
                write!(f, "{}", if c != 0 { 'o' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
