//! Criterion benchmarks for the combinatorial security game

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use equilibrium_security::{
    compute_vulnerability_details, find_pure_equilibria, replicator_dynamics, PayoffMatrix,
    ReplicatorConfig, VulnerabilityDetail, VulnerabilityRecord,
};

fn details(k: usize) -> Vec<VulnerabilityDetail> {
    let records: Vec<_> = (0..k)
        .map(|i| VulnerabilityRecord {
            id: None,
            subsystem_index: i % 4,
            impact_score: 2.0 + (i % 7) as f64,
            exploit_score: 1.0 + (i % 9) as f64,
            exploit_exists: (i % 2) as u8,
        })
        .collect();
    compute_vulnerability_details(&records, &[1.0, 2.0, 0.5, 3.0], 1.0, 2.0).unwrap()
}

fn benchmark_payoff_matrix_8(c: &mut Criterion) {
    let details = details(8);
    c.bench_function("payoff_matrix_k8", |b| {
        b.iter(|| PayoffMatrix::build(black_box(&details)).unwrap())
    });
}

fn benchmark_pure_search_8(c: &mut Criterion) {
    let matrix = PayoffMatrix::build(&details(8)).unwrap();
    c.bench_function("pure_search_k8", |b| {
        b.iter(|| find_pure_equilibria(black_box(&matrix)))
    });
}

fn benchmark_replicator_4(c: &mut Criterion) {
    let matrix = PayoffMatrix::build(&details(4)).unwrap();
    c.bench_function("replicator_k4_10000", |b| {
        b.iter(|| replicator_dynamics(black_box(&matrix), ReplicatorConfig::default()))
    });
}

criterion_group!(
    benches,
    benchmark_payoff_matrix_8,
    benchmark_pure_search_8,
    benchmark_replicator_4,
);
criterion_main!(benches);
