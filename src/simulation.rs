use crate::{rle, Engine, Grid, Result, RuleSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// One running automaton: a rule, a double-buffered board and a run flag.
///
/// All methods take `&self`, so a `Simulation` can be shared behind an `Arc`
/// between a tick driver and a renderer. The rule is fixed for the lifetime
/// of the simulation; loading a pattern with another rule means building a
/// new `Simulation`.
pub struct Simulation {
    rule: RuleSet,
    engine: Engine,
    running: AtomicBool,
    generation: AtomicU64,
}

impl Simulation {
    /// Creates a stopped simulation on an all-dead `size x size` board.
    pub fn new(size: usize, rule: RuleSet) -> Result<Self> {
        Ok(Self::from_engine(Engine::new(size)?, rule))
    }

    /// Creates a stopped simulation starting from `grid`.
    pub fn with_grid(grid: Grid, rule: RuleSet) -> Result<Self> {
        Ok(Self::from_engine(Engine::with_grid(grid)?, rule))
    }

    /// Loads an RLE pattern (plain or `.gz`) into a fresh `size x size` board.
    ///
    /// # Errors
    ///
    /// Any error from [`rle::load`]. Decoding finishes before the engine is
    /// built, so a failed load never leaves a partially filled board behind.
    pub fn from_file(path: impl AsRef<Path>, size: usize) -> Result<Self> {
        let (grid, rule) = rle::load(path, size)?;
        Self::with_grid(grid, rule)
    }

    fn from_engine(engine: Engine, rule: RuleSet) -> Self {
        debug!(
            size = engine.size(),
            bytes = engine.bytes_total(),
            rule = %rule,
            "allocated board"
        );
        Self {
            rule,
            engine,
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn rule(&self) -> &RuleSet {
        &self.rule
    }

    pub fn size(&self) -> usize {
        self.engine.size()
    }

    /// Flips the run flag and returns the new value.
    pub fn start_stop(&self) -> bool {
        let running = !self.running.fetch_xor(true, Ordering::Relaxed);
        debug!(running, "toggled run state");
        running
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Number of steps taken since the simulation was created.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// See [`Engine::get`].
    pub fn get<C: TryInto<usize>>(&self, x: C, y: C) -> bool {
        self.engine.get(x, y)
    }

    /// See [`Engine::toggle`]. Works whether or not the simulation is running.
    pub fn toggle<C: TryInto<usize>>(&self, x: C, y: C) {
        self.engine.toggle(x, y);
    }

    /// Advances one generation using `workers` threads.
    pub fn step(&self, workers: usize) {
        self.engine.step(&self.rule, workers);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(generation, workers, "advanced generation");
    }

    /// See [`Engine::apply_parallel`].
    pub fn apply_parallel<F>(&self, workers: usize, f: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        self.engine.apply_parallel(workers, f);
    }

    /// Runs `f` with shared access to the live board.
    pub fn with_live<R>(&self, f: impl FnOnce(&Grid) -> R) -> R {
        self.engine.with_live(f)
    }

    pub fn snapshot(&self) -> Grid {
        self.engine.snapshot()
    }

    pub fn population(&self) -> usize {
        self.engine.with_live(Grid::population)
    }

    /// Writes the live board and the rule to `path` as RLE (`.gz` compresses).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let grid = self.engine.snapshot();
        rle::save(path, &grid, &self.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LifeError;

    fn glider(size: usize) -> Simulation {
        let sim = Simulation::new(size, RuleSet::conway()).unwrap();
        for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            sim.toggle(x, y);
        }
        sim
    }

    #[test]
    fn test_start_stop() {
        let sim = Simulation::new(4, RuleSet::conway()).unwrap();
        assert!(!sim.is_running());
        assert!(sim.start_stop());
        assert!(sim.is_running());
        assert!(!sim.start_stop());
        assert!(!sim.is_running());
    }

    #[test]
    fn test_glider_translates() {
        let sim = glider(10);
        let before = sim.snapshot();
        for _ in 0..4 {
            sim.step(3);
        }
        assert_eq!(sim.generation(), 4);
        let after = sim.snapshot();
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(before.get(x, y), after.get(x + 1, y + 1), "({x}, {y})");
            }
        }
        assert_eq!(after.population(), 5);
    }

    #[test]
    fn test_population_and_toggle_while_stopped() {
        let sim = glider(6);
        assert_eq!(sim.population(), 5);
        sim.toggle(5, 5);
        sim.toggle(6, 5);
        assert_eq!(sim.population(), 6);
    }

    #[test]
    fn test_apply_parallel_reads_live_board() {
        let sim = glider(8);
        let alive = std::sync::Mutex::new(vec![]);
        sim.apply_parallel(4, |x, y| {
            if sim.get(x, y) {
                alive.lock().unwrap().push((x, y));
            }
        });
        let mut alive = alive.into_inner().unwrap();
        alive.sort();
        assert_eq!(alive, vec![(0, 2), (1, 0), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("{}-gridlife_sim.rle", std::process::id()));
        let sim = glider(12);
        sim.step(2);
        sim.save(&path).unwrap();
        let loaded = Simulation::from_file(&path, 12).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.snapshot(), sim.snapshot());
        assert_eq!(loaded.rule(), sim.rule());
        assert_eq!(loaded.generation(), 0);
    }

    #[test]
    fn test_load_too_wide_fails() {
        let path = std::env::temp_dir().join(format!("{}-gridlife_wide.rle", std::process::id()));
        std::fs::write(&path, "x = 6, y = 1, rule = B3/S23\n6o!").unwrap();
        let result = Simulation::from_file(&path, 5);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(LifeError::PatternExceedsBounds { .. })
        ));
    }
}
