use crate::util::{advance, load};
use clap::Args;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Args, Debug)]
pub(super) struct ShowArgs {
    /// Path to the file containing the pattern; supports .rle and .rle.gz formats
    pattern: String,

    /// Side length of the square board
    #[arg(short, long, default_value_t = 20)]
    size: usize,

    /// The number of generations to advance before printing
    #[arg(short, long, default_value_t = 0)]
    generations: u64,

    /// The number of worker threads to use
    #[arg(short, long, default_value_t = gridlife::default_workers())]
    workers: usize,
}

pub(super) fn run_show(args: ShowArgs) -> anyhow::Result<()> {
    let sim = load(&args.pattern, args.size)?;
    if args.generations > 0 {
        advance(&sim, args.generations, args.workers);
    }

    let size = sim.size();
    let frame: Vec<AtomicBool> = (0..size * size).map(|_| AtomicBool::new(false)).collect();
    sim.apply_parallel(args.workers, |x, y| {
        if sim.get(x, y) {
            frame[y * size + x].store(true, Ordering::Relaxed);
        }
    });

    let mut out = String::with_capacity(size * (size + 1));
    for row in frame.chunks(size) {
        out.extend(row.iter().map(|c| {
            if c.load(Ordering::Relaxed) {
                'o'
            } else {
                '.'
            }
        }));
        out.push('\n');
    }
    print!("{out}");
    Ok(())
}
