use anyhow::Context;
use gridlife::Simulation;
use num_format::{CustomFormat, Grouping, ToFormattedString};
use tracing_subscriber::EnvFilter;

pub(super) fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(super) fn print_population(sim: &Simulation) -> anyhow::Result<()> {
    let fmt = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator("_")
        .build()
        .context("building number format")?;
    println!("Population: {}", sim.population().to_formatted_string(&fmt));
    Ok(())
}

pub(super) fn load(path: &str, size: usize) -> anyhow::Result<Simulation> {
    let timer = std::time::Instant::now();
    let sim = Simulation::from_file(path, size).with_context(|| format!("loading {path}"))?;
    println!(
        "Loaded pattern in {:.1} secs",
        timer.elapsed().as_secs_f64()
    );
    Ok(sim)
}

pub(super) fn advance(sim: &Simulation, generations: u64, workers: usize) {
    let timer = std::time::Instant::now();
    for _ in 0..generations {
        sim.step(workers);
    }
    println!(
        "Updated pattern by {} generations in {:.1} secs",
        generations,
        timer.elapsed().as_secs_f64()
    );
}
