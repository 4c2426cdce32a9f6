use crate::util::{advance, load, print_population};
use anyhow::Context;
use clap::Args;
use gridlife::{Grid, RuleSet, Simulation};

#[derive(Args, Debug)]
pub(super) struct UpdateArgs {
    /// Path to the file containing the pattern; supports .rle and .rle.gz formats.
    /// Starts from an empty (or random) board when omitted
    pattern: Option<String>,

    /// Side length of the square board
    #[arg(short, long, default_value_t = 20)]
    size: usize,

    /// The number of worker threads to use for each step
    #[arg(short, long, default_value_t = gridlife::default_workers())]
    workers: usize,

    /// The number of generations to advance
    #[arg(short, long)]
    generations: u64,

    /// Rule in B/S notation; overrides the one stored in the pattern
    #[arg(short, long)]
    rule: Option<RuleSet>,

    /// Fill the board randomly with the given seed instead of loading a pattern
    #[arg(long)]
    random: Option<u64>,

    /// Path to the file where the resulting pattern will be saved
    #[arg(short, long)]
    output: Option<String>,

    /// Count population of the resulting pattern
    #[arg(short, long)]
    population: bool,
}

pub(super) fn run_update(args: UpdateArgs) -> anyhow::Result<()> {
    let sim = match (&args.pattern, args.random) {
        (Some(path), _) => {
            let loaded = load(path, args.size)?;
            match args.rule {
                Some(rule) if rule != *loaded.rule() => {
                    Simulation::with_grid(loaded.snapshot(), rule)?
                }
                _ => loaded,
            }
        }
        (None, seed) => {
            let rule = args.rule.unwrap_or_default();
            let grid = match seed {
                Some(seed) => Grid::random(args.size, Some(seed)),
                None => Grid::new(args.size),
            };
            Simulation::with_grid(grid, rule).context("creating board")?
        }
    };

    advance(&sim, args.generations, args.workers);

    if args.population {
        print_population(&sim)?;
    }
    if let Some(output) = &args.output {
        sim.save(output)
            .with_context(|| format!("saving {output}"))?;
    }
    Ok(())
}
