#![warn(clippy::all)]

mod driver;
mod engine;
mod error;
mod grid;
mod parallel;
pub mod rle;
mod rule;
mod simulation;

pub use driver::{Command, TickDriver, DEFAULT_TICK_INTERVAL, TICK_ADJUSTMENT};
pub use engine::Engine;
pub use error::{LifeError, Result};
pub use grid::Grid;
pub use rle::PatternFormat;
pub use rule::{RuleSet, MAX_NEIGHBORS};
pub use simulation::Simulation;

pub const VERSION: &str = "0.1.0";

/// Worker count to use when the caller has no preference: the available
/// hardware parallelism, or 1 if it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}
