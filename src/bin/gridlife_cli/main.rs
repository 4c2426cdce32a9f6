mod show;
mod stats;
mod update;
mod util;

use clap::{Parser, Subcommand};
use show::{run_show, ShowArgs};
use stats::{run_stats, StatsArgs};
use update::{run_update, UpdateArgs};

#[derive(Parser, Debug)]
#[command(version, about)]
struct CLIParser {
    /// Log every generation step (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Advance a pattern on a bounded board using the parallel step engine
    Update(UpdateArgs),
    /// Print the board as rows of `o` (alive) and `.` (dead)
    Show(ShowArgs),
    /// Compute the pattern's rule, hash, population and extent
    Stats(StatsArgs),
}

fn main() -> anyhow::Result<()> {
    let args = CLIParser::parse();
    util::init_logging(args.verbose);

    match args.action {
        Action::Update(args) => run_update(args),
        Action::Show(args) => run_show(args),
        Action::Stats(args) => run_stats(args),
    }
}
