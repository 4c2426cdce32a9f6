use crate::Simulation;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);
/// Amount by which [`Command::Faster`] and [`Command::Slower`] change the interval.
pub const TICK_ADJUSTMENT: Duration = Duration::from_millis(100);

/// Input accepted by [`TickDriver::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pause or resume automatic stepping.
    StartStop,
    /// Flip one cell; out-of-range coordinates are ignored.
    Toggle { x: i64, y: i64 },
    /// Advance exactly one generation, even while paused.
    Step,
    /// Shorten the tick interval, down to [`TICK_ADJUSTMENT`].
    Faster,
    /// Lengthen the tick interval.
    Slower,
    /// Save the live board.
    Save(PathBuf),
    Quit,
}

/// Drives a [`Simulation`] from a ticker and a command channel.
///
/// Every tick steps the simulation if it is running and then calls the redraw
/// callback. Commands are handled one at a time between ticks, and each step is
/// awaited before the next command is read, so toggles never overlap a step.
pub struct TickDriver {
    simulation: Arc<Simulation>,
    workers: usize,
    interval: Duration,
}

impl TickDriver {
    pub fn new(simulation: Arc<Simulation>, workers: usize) -> Self {
        Self {
            simulation,
            workers,
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn simulation(&self) -> &Arc<Simulation> {
        &self.simulation
    }

    /// Shortens the interval by [`TICK_ADJUSTMENT`] if it is still above it.
    /// Returns whether the interval changed.
    pub fn faster(&mut self) -> bool {
        if self.interval > TICK_ADJUSTMENT {
            self.interval -= TICK_ADJUSTMENT;
            true
        } else {
            false
        }
    }

    pub fn slower(&mut self) {
        self.interval += TICK_ADJUSTMENT;
    }

    /// First tick is one full interval away; a fresh ticker never fires at once.
    fn ticker(&self) -> Interval {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    async fn advance(&self) -> Result<()> {
        let simulation = Arc::clone(&self.simulation);
        let workers = self.workers;
        tokio::task::spawn_blocking(move || simulation.step(workers))
            .await
            .context("step worker panicked")
    }

    /// Runs until [`Command::Quit`] arrives or every sender is dropped.
    ///
    /// `redraw` is called after each tick, each toggle and each manual step.
    pub async fn run<R>(mut self, mut commands: mpsc::Receiver<Command>, mut redraw: R) -> Result<()>
    where
        R: FnMut(&Simulation),
    {
        let mut ticker = self.ticker();
        info!(
            size = self.simulation.size(),
            rule = %self.simulation.rule(),
            workers = self.workers,
            "tick driver started"
        );

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    match command {
                        Command::StartStop => {
                            self.simulation.start_stop();
                        }
                        Command::Toggle { x, y } => {
                            self.simulation.toggle(x, y);
                            redraw(&*self.simulation);
                        }
                        Command::Step => {
                            self.advance().await?;
                            redraw(&*self.simulation);
                        }
                        Command::Faster => {
                            if self.faster() {
                                debug!(interval = ?self.interval, "tick interval changed");
                                ticker = self.ticker();
                            }
                        }
                        Command::Slower => {
                            self.slower();
                            debug!(interval = ?self.interval, "tick interval changed");
                            ticker = self.ticker();
                        }
                        Command::Save(path) => {
                            if let Err(err) = self.simulation.save(&path) {
                                warn!(path = %path.display(), %err, "failed to save pattern");
                            }
                        }
                        Command::Quit => break,
                    }
                }
                _ = ticker.tick() => {
                    if self.simulation.is_running() {
                        self.advance().await?;
                    }
                    redraw(&*self.simulation);
                }
            }
        }

        info!(
            generation = self.simulation.generation(),
            "tick driver stopped"
        );
        Ok(())
    }
}
