use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use phage_core::{build_headless_app, run_tick, SimulationConfig};

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for size in [16u32, 40, 64, 128] {
        group.bench_with_input(BenchmarkId::new("lattice", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let config = SimulationConfig {
                        lattice_size: size,
                        ..SimulationConfig::default()
                    };
                    let mut app = build_headless_app(config).expect("bench config is valid");
                    // Let the islands spread before timing.
                    for _ in 0..60 {
                        run_tick(&mut app);
                    }
                    app
                },
                |mut app| {
                    run_tick(&mut app);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(tick_benches, bench_tick);
criterion_main!(tick_benches);
