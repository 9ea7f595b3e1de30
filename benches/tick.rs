//! Tick throughput with a populated board.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use enclosure::{LevelSetup, PlacementRequest, SimConfig, Simulation};

fn populated(balls: usize) -> Simulation {
    let config = SimConfig::default();
    let setup = LevelSetup::generate(42, balls, &config);
    let mut sim = Simulation::new(config);
    for spawn in &setup.balls {
        sim.spawn(spawn).expect("generated spawn is valid");
    }
    sim
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for balls in [1usize, 8, 32] {
        group.bench_with_input(BenchmarkId::new("balls", balls), &balls, |b, &balls| {
            let mut sim = populated(balls);
            b.iter(|| black_box(sim.tick(&[])));
        });
    }
    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    c.bench_function("tick_with_growing_walls", |b| {
        b.iter_batched(
            || {
                let mut sim = populated(4);
                sim.tick(&[PlacementRequest::vertical(16, 10)]);
                sim
            },
            |mut sim| {
                for _ in 0..60 {
                    black_box(sim.tick(&[]));
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_tick, bench_placement);
criterion_main!(benches);
