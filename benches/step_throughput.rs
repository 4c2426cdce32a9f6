use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridlife::{Grid, RuleSet, Simulation};

const SEED: u64 = 42;
const SIZE: usize = 512;

fn step_throughput_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Step Throughput");
    group.throughput(Throughput::Elements((SIZE * SIZE) as u64));

    let thread_counts = [1, 2, 4, 8, gridlife::default_workers()];

    for &workers in &thread_counts {
        let sim = Simulation::with_grid(Grid::random(SIZE, Some(SEED)), RuleSet::conway()).unwrap();
        group.bench_with_input(
            BenchmarkId::new("step", format!("{} Workers", workers)),
            &workers,
            |b, &w| {
                b.iter(|| sim.step(w));
            },
        );
    }

    group.finish();
}

fn apply_parallel_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Apply Parallel");
    group.throughput(Throughput::Elements((SIZE * SIZE) as u64));

    let sim = Simulation::with_grid(Grid::random(SIZE, Some(SEED)), RuleSet::conway()).unwrap();
    for workers in [1, gridlife::default_workers()] {
        group.bench_with_input(
            BenchmarkId::new("population", format!("{} Workers", workers)),
            &workers,
            |b, &w| {
                b.iter(|| {
                    let alive = std::sync::atomic::AtomicUsize::new(0);
                    sim.apply_parallel(w, |x, y| {
                        if sim.get(x, y) {
                            alive.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    });
                    alive.into_inner()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, step_throughput_benchmark, apply_parallel_benchmark);
criterion_main!(benches);
