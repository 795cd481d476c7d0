//! Criterion benchmarks for model building and tube extraction.
//!
//! Run with: cargo bench
//! Run specific group: cargo bench -- tube

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

use teetool::{BasisConfig, BuiltWorld, ModelConfig, Trial, World};

/// `count` noisy straight trials around `y = offset`
fn bundle(rng: &mut StdRng, offset: f64, count: usize) -> Vec<Trial> {
    let spread = Normal::new(0.0, 1.0).unwrap();
    let noise = Normal::new(0.0, 0.05).unwrap();
    (0..count)
        .map(|_| {
            let shift = spread.sample(rng);
            let times: Vec<f64> = (0..50).map(|i| i as f64).collect();
            let rows: Vec<Vec<f64>> = times
                .iter()
                .map(|&t| vec![t * 0.2 + noise.sample(rng), offset + shift + noise.sample(rng)])
                .collect();
            Trial::from_rows(times, &rows).unwrap()
        })
        .collect()
}

fn world(resolution: usize) -> World {
    let mut rng = StdRng::seed_from_u64(42);
    let mut world = World::new(2, resolution).unwrap();
    world.add_condition(bundle(&mut rng, 0.0, 20), "a").unwrap();
    world.add_condition(bundle(&mut rng, 8.0, 20), "b").unwrap();
    world
}

fn built(resolution: usize) -> BuiltWorld {
    world(resolution)
        .build_model(&ModelConfig::resampling(50))
        .unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let configs = [
        ("resampling", ModelConfig::resampling(50)),
        ("parametric_em", ModelConfig::parametric(50, BasisConfig::default())),
    ];
    for (name, config) in configs.iter() {
        group.bench_function(BenchmarkId::new("world", name), |b| {
            b.iter(|| world(50).build_model(config).unwrap())
        });
    }
    group.finish();
}

fn bench_tube(c: &mut Criterion) {
    let mut group = c.benchmark_group("tube");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for resolution in [50, 100, 200] {
        let built = built(resolution);
        group.bench_function(BenchmarkId::new("sd1", resolution), |b| {
            b.iter(|| built.get_tube(&[0, 1], 1.0).unwrap())
        });
    }
    group.finish();
}

fn bench_density(c: &mut Criterion) {
    let mut group = c.benchmark_group("density");
    group.sample_size(20);

    for resolution in [50, 100] {
        let built = built(resolution);
        group.bench_function(BenchmarkId::new("log_likelihood", resolution), |b| {
            b.iter(|| built.get_log_likelihood(&[0, 1]).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_tube, bench_density);
criterion_main!(benches);
