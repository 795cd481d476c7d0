//! Two bundles of trajectories: build both models and print their tubes.
//!
//! Run with: cargo run --example two_clusters

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use teetool::{LoggingReporter, ModelConfig, ModelError, Trial, World};

/// Noisy trials from `start` to `end`, with irregular sampling
fn bundle(rng: &mut StdRng, start: [f64; 2], end: [f64; 2], count: usize) -> Vec<Trial> {
    let spread = Normal::new(0.0, 0.8).unwrap();
    let noise = Normal::new(0.0, 0.05).unwrap();
    (0..count)
        .map(|k| {
            let shift = spread.sample(rng);
            let samples = 20 + 5 * (k % 3);
            let times: Vec<f64> = (0..samples).map(|i| i as f64 / samples as f64).collect();
            let rows: Vec<Vec<f64>> = times
                .iter()
                .map(|&s| {
                    vec![
                        start[0] + s * (end[0] - start[0]) + noise.sample(rng),
                        start[1] + s * (end[1] - start[1]) + shift + noise.sample(rng),
                    ]
                })
                .collect();
            Trial::from_rows(times, &rows).unwrap()
        })
        .collect()
}

fn main() -> Result<(), ModelError> {
    let mut rng = StdRng::seed_from_u64(7);

    let mut world = World::new(2, 80)?;
    world.add_condition(bundle(&mut rng, [0.0, 0.0], [10.0, 2.0], 8), "rising")?;
    world.add_condition(bundle(&mut rng, [0.0, 10.0], [10.0, 6.0], 8), "falling")?;

    let built = world.build_model_with_reporter(&ModelConfig::resampling(40), &mut LoggingReporter)?;

    for mean in built.get_mean(&[0, 1])? {
        let last = mean.len() - 1;
        println!(
            "{}: mean from ({:.2}, {:.2}) to ({:.2}, {:.2})",
            mean.label,
            mean.points[(0, 0)],
            mean.points[(0, 1)],
            mean.points[(last, 0)],
            mean.points[(last, 1)]
        );
    }

    for sd in [1.0, 2.0] {
        for tube in built.get_tube(&[0, 1], sd)? {
            println!(
                "{} at {} sd: {} nodes inside, {} boundary pieces ({} points)",
                tube.label,
                sd,
                tube.inside_count(),
                tube.boundary.len(),
                tube.boundary.iter().map(|p| p.len()).sum::<usize>()
            );
        }
    }

    let outline = built.outline(&[0, 1], 2.0)?;
    println!("2 sd outline: {:?} to {:?}", outline.lower, outline.upper);
    println!("{}", built.config_snapshot().to_json_pretty());
    Ok(())
}
