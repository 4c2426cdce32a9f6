use crate::util::{load, print_population};
use clap::Args;

#[derive(Args, Debug)]
pub(super) struct StatsArgs {
    /// Path to the file containing the pattern; supports .rle and .rle.gz formats
    pattern: String,

    /// Side length of the square board
    #[arg(short, long, default_value_t = 20)]
    size: usize,
}

pub(super) fn run_stats(args: StatsArgs) -> anyhow::Result<()> {
    let timer = std::time::Instant::now();
    let sim = load(&args.pattern, args.size)?;
    println!("Rule: {}", sim.rule());
    println!("Hash: 0x{:016x}", sim.with_live(|grid| grid.hash()));
    print_population(&sim)?;
    match sim.with_live(|grid| grid.last_alive_row()) {
        Some(row) => println!("Highest alive row: {row}"),
        None => println!("Highest alive row: none"),
    }
    println!(
        "Computed stats in {:.1} secs",
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}
