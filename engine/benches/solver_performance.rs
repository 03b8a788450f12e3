//! Criterion benchmarks for exact and approximate solver throughput

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use equilibrium_engine::presets::{chicken, rock_paper_scissors};
use equilibrium_engine::{ApproxConfig, ApproximateSolver, CancelToken, ExactSolver, Game};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn benchmark_exact_chicken(c: &mut Criterion) {
    let game = chicken();
    c.bench_function("exact_chicken", |b| {
        b.iter(|| ExactSolver::new(black_box(&game)).solve(&CancelToken::new(), &mut ()))
    });
}

fn benchmark_exact_random_3x6(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    let game = Game::random(3, 6, &mut rng).unwrap();
    c.bench_function("exact_random_3x6", |b| {
        b.iter(|| ExactSolver::new(black_box(&game)).solve(&CancelToken::new(), &mut ()))
    });
}

fn benchmark_approximate_200_rounds(c: &mut Criterion) {
    let game = rock_paper_scissors();
    let config = ApproxConfig {
        epsilon: 0.0,
        max_iterations: 200,
        seed: Some(7),
    };
    c.bench_function("approximate_rps_200_rounds", |b| {
        b.iter_batched(
            || ApproximateSolver::new(&game, config).unwrap(),
            |mut solver| {
                let report = solver.solve(&CancelToken::new(), &mut ());
                black_box(report.iterations);
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_random_game(c: &mut Criterion) {
    c.bench_function("random_game_2x10", |b| {
        b.iter_batched(
            || SmallRng::seed_from_u64(1),
            |mut rng| black_box(Game::random(2, 10, &mut rng).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    benchmark_exact_chicken,
    benchmark_exact_random_3x6,
    benchmark_approximate_200_rounds,
    benchmark_random_game,
);
criterion_main!(benches);
