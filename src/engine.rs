use crate::{parallel::fan_out, Grid, LifeError, Result, RuleSet};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Double-buffered board of a bounded Life-like simulation.
///
/// # Overview
///
/// The engine owns two grids of the same size: `live`, which readers see, and
/// `scratch`, which is only written while a step is in progress. A step reads
/// `live`, writes every cell of `scratch` from a pool of worker threads that
/// each own whole rows, and then exchanges the two buffers. The exchange swaps
/// the `Vec` handles under the write lock of `live`, so it is O(1) and a
/// concurrent reader sees either the old or the new generation, never a mix.
///
/// # Caller contract
///
/// Steps are meant to be driven one at a time (a second concurrent `step`
/// waits on the scratch buffer). A `toggle` issued from another thread while a
/// step is sweeping blocks until the sweep has finished reading `live`; callers
/// that need a toggle to land before or after a particular generation should
/// serialize toggles and steps on one thread, as [`crate::TickDriver`] does.
///
/// # Example
///
/// ```rust
/// use gridlife::{Engine, RuleSet};
///
/// let engine = Engine::new(8).unwrap();
/// // blinker
/// for x in 2..5 {
///     engine.toggle(x, 3);
/// }
/// engine.step(&RuleSet::conway(), 2);
/// assert!(engine.get(3, 2) && engine.get(3, 3) && engine.get(3, 4));
/// assert!(!engine.get(2, 3));
/// ```
pub struct Engine {
    size: usize,
    live: RwLock<Grid>,
    scratch: Mutex<Grid>,
}

impl Engine {
    /// Creates an engine with both buffers zero-filled.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::InvalidSize`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(LifeError::InvalidSize(size));
        }
        Ok(Self {
            size,
            live: RwLock::new(Grid::new(size)),
            scratch: Mutex::new(Grid::new(size)),
        })
    }

    /// Creates an engine whose live buffer is `grid`.
    pub fn with_grid(grid: Grid) -> Result<Self> {
        let engine = Self::new(grid.size())?;
        engine.replace(grid)?;
        Ok(engine)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    // The cells are plain bytes, so a panic in another holder cannot leave
    // them in an unusable state.
    fn read_live(&self) -> RwLockReadGuard<'_, Grid> {
        self.live.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_live(&self) -> RwLockWriteGuard<'_, Grid> {
        self.live.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scratch(&self) -> MutexGuard<'_, Grid> {
        self.scratch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true iff `(x, y)` is alive on the live board.
    /// Coordinates that are negative or beyond the grid read as dead.
    pub fn get<C: TryInto<usize>>(&self, x: C, y: C) -> bool {
        match to_coords(x, y) {
            Some((x, y)) => self.read_live().get(x, y),
            None => false,
        }
    }

    /// Flips `(x, y)` on the live board. Coordinates outside the grid are a no-op.
    pub fn toggle<C: TryInto<usize>>(&self, x: C, y: C) {
        if let Some((x, y)) = to_coords(x, y) {
            self.write_live().toggle(x, y);
        }
    }

    /// Runs `f` with shared access to the live board.
    pub fn with_live<R>(&self, f: impl FnOnce(&Grid) -> R) -> R {
        f(&self.read_live())
    }

    /// Copy of the live board.
    pub fn snapshot(&self) -> Grid {
        self.read_live().clone()
    }

    /// Replaces the live board wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::SizeMismatch`] if `grid` is not `size x size`;
    /// the live board is left untouched in that case.
    pub fn replace(&self, grid: Grid) -> Result<()> {
        if grid.size() != self.size {
            return Err(LifeError::SizeMismatch {
                expected: self.size,
                actual: grid.size(),
            });
        }
        *self.write_live() = grid;
        Ok(())
    }

    /// Calls `f(x, y)` exactly once for every coordinate of the grid, spread
    /// over `workers` threads, and returns after the last call has finished.
    ///
    /// There is no ordering guarantee between cells. `workers == 0` is
    /// treated as 1.
    pub fn apply_parallel<F>(&self, workers: usize, f: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        let size = self.size;
        fan_out(workers, 0..size, |y| {
            for x in 0..size {
                f(x, y);
            }
        });
    }

    /// Advances the live board by one generation under `rule`.
    ///
    /// The result does not depend on `workers`: every next-state is computed
    /// from `live` alone, and each scratch row is written by exactly one worker.
    pub fn step(&self, rule: &RuleSet, workers: usize) {
        let mut scratch = self.lock_scratch();
        scratch.clear();
        {
            let live = self.read_live();
            let live: &Grid = &live;
            fan_out(workers, scratch.rows_mut().enumerate(), |(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = live.next_state(rule, x, y) as u8;
                }
            });
        }
        let mut live = self.write_live();
        std::mem::swap(&mut *live, &mut *scratch);
    }

    /// Approximate heap memory used by both buffers, in bytes.
    pub fn bytes_total(&self) -> usize {
        2 * self.size * self.size
    }
}

fn to_coords<C: TryInto<usize>>(x: C, y: C) -> Option<(usize, usize)> {
    Some((x.try_into().ok()?, y.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    const SEED: u64 = 42;

    fn workers_to_try() -> Vec<usize> {
        vec![1, 2, 3, crate::default_workers()]
    }

    fn naive_step(grid: &Grid, rule: &RuleSet) -> Grid {
        let n = grid.size() as isize;
        let mut next = Grid::new(grid.size());
        for y in 0..n {
            for x in 0..n {
                let mut sum = 0;
                for (dx, dy) in [
                    (-1, -1),
                    (0, -1),
                    (1, -1),
                    (-1, 0),
                    (1, 0),
                    (-1, 1),
                    (0, 1),
                    (1, 1),
                ] {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && ny >= 0 && nx < n && ny < n && grid.get(nx as usize, ny as usize)
                    {
                        sum += 1;
                    }
                }
                let alive = grid.get(x as usize, y as usize);
                next.set(x as usize, y as usize, rule.next_state(alive, sum));
            }
        }
        next
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(Engine::new(0), Err(LifeError::InvalidSize(0))));
    }

    #[test]
    fn test_bytes_total() {
        let engine = Engine::new(16).unwrap();
        assert_eq!(engine.size(), 16);
        assert_eq!(engine.bytes_total(), 2 * 16 * 16);
    }

    #[test]
    fn test_toggle_out_of_bounds_is_noop() {
        let engine = Engine::new(4).unwrap();
        engine.toggle(-1, 0);
        engine.toggle(0, -1);
        engine.toggle(4, 0);
        engine.toggle(0, 4);
        engine.toggle(usize::MAX, 0);
        assert!(engine.snapshot().is_blank());
        assert!(!engine.get(-1, 0));
        assert!(!engine.get(4, 4));
    }

    #[test]
    fn test_toggle_twice() {
        let engine = Engine::new(4).unwrap();
        engine.toggle(1, 2);
        assert!(engine.get(1, 2));
        assert!(!engine.get(2, 1));
        engine.toggle(1, 2);
        assert!(!engine.get(1, 2));
    }

    #[test]
    fn test_apply_parallel_visits_every_cell_once() {
        let size = 13;
        let engine = Engine::new(size).unwrap();
        for workers in [0, 1, 4, 100] {
            let hits: Vec<AtomicUsize> = (0..size * size).map(|_| AtomicUsize::new(0)).collect();
            engine.apply_parallel(workers, |x, y| {
                hits[x + y * size].fetch_add(1, Ordering::Relaxed);
            });
            assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        }
    }

    #[test]
    fn test_plus_shape_on_3x3() {
        let engine = Engine::new(3).unwrap();
        for (x, y) in [(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)] {
            engine.toggle(x, y);
        }
        engine.step(&RuleSet::conway(), 2);
        // corners have 3 neighbors and are born, the center has 4 and dies,
        // the arms have 3 and survive
        let mut expected = Grid::new(3);
        for y in 0..3 {
            for x in 0..3 {
                expected.set(x, y, !(x == 1 && y == 1));
            }
        }
        assert_eq!(engine.snapshot(), expected);
    }

    #[test]
    fn test_matches_naive_step() {
        let rules = ["B3/S23", "B36/S23", "B2/S", "B3678/S34678", "B/S012345678"];
        for rule in rules.map(|r| RuleSet::parse(r).unwrap()) {
            let grid = Grid::random(24, Some(SEED));
            let engine = Engine::with_grid(grid.clone()).unwrap();
            let mut expected = grid;
            for _ in 0..5 {
                expected = naive_step(&expected, &rule);
                engine.step(&rule, 3);
                assert_eq!(engine.snapshot(), expected, "rule {}", rule);
            }
        }
    }

    #[test]
    fn test_step_is_worker_count_invariant() {
        let rule = RuleSet::conway();
        let grid = Grid::random(40, Some(SEED));
        let mut hashes = vec![];
        for workers in workers_to_try() {
            let engine = Engine::with_grid(grid.clone()).unwrap();
            for _ in 0..10 {
                engine.step(&rule, workers);
            }
            hashes.push(engine.snapshot().hash());
        }
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_replace_size_mismatch_keeps_board() {
        let engine = Engine::new(5).unwrap();
        engine.toggle(2, 2);
        let err = engine.replace(Grid::new(6)).unwrap_err();
        assert!(matches!(
            err,
            LifeError::SizeMismatch {
                expected: 5,
                actual: 6
            }
        ));
        assert!(engine.get(2, 2));
    }

    #[test]
    fn test_reader_never_sees_torn_board() {
        // a blinker alternates between two known boards
        let engine = Engine::new(5).unwrap();
        for x in 1..4 {
            engine.toggle(x, 2);
        }
        let horizontal = engine.snapshot().hash();
        engine.step(&RuleSet::conway(), 1);
        let vertical = engine.snapshot().hash();

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..200 {
                    engine.step(&RuleSet::conway(), 2);
                }
            });
            for _ in 0..200 {
                let h = engine.with_live(|g| g.hash());
                assert!(h == horizontal || h == vertical);
            }
        });
    }
}
