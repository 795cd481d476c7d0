//! Synthetic trial fixtures
//!
//! Bundles of noisy straight-line trials drawn from a seeded `StdRng`, so
//! every test sees the same data on every run.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use teetool::Trial;

/// Offsets of the trials across the bundle, in units of the spread
const ACROSS: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

/// Jitter pattern of the start and end points along the bundle
const ALONG_START: [f64; 5] = [0.5, -1.0, 1.0, 0.0, -0.5];
const ALONG_END: [f64; 5] = [-1.0, 0.5, 0.0, 1.0, -0.5];

/// Shape of a bundle of straight-line trials
#[derive(Debug, Clone, Copy)]
pub struct Bundle {
    /// Mean start point
    pub start: [f64; 2],
    /// Mean end point
    pub end: [f64; 2],
    /// Spread of the trials across the bundle
    pub spread: f64,
    /// Jitter of the start/end points along the bundle
    pub jitter: f64,
    /// Per-sample noise standard deviation
    pub noise: f64,
    /// Samples per trial
    pub samples: usize,
}

impl Bundle {
    /// Horizontal bundle from `(0, y)` to `(10, y)`
    pub fn horizontal(y: f64) -> Self {
        Self {
            start: [0.0, y],
            end: [10.0, y],
            spread: 1.0,
            jitter: 0.6,
            noise: 0.02,
            samples: 20,
        }
    }
}

/// Seeded generator for the test fixtures
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `count` trials of `bundle`; trials beyond the fifth repeat the pattern.
pub fn line_bundle(rng: &mut StdRng, bundle: &Bundle, count: usize) -> Vec<Trial> {
    let noise = Normal::new(0.0, bundle.noise).unwrap();
    let dx = bundle.end[0] - bundle.start[0];
    let dy = bundle.end[1] - bundle.start[1];
    let length = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / length, dy / length);
    // Unit normal to the bundle direction
    let (nx, ny) = (-uy, ux);

    (0..count)
        .map(|k| {
            let across = ACROSS[k % 5] * bundle.spread;
            let a = ALONG_START[k % 5] * bundle.jitter;
            let b = ALONG_END[k % 5] * bundle.jitter;
            let p0 = [
                bundle.start[0] + a * ux + across * nx,
                bundle.start[1] + a * uy + across * ny,
            ];
            let p1 = [
                bundle.end[0] + b * ux + across * nx,
                bundle.end[1] + b * uy + across * ny,
            ];

            let n = bundle.samples;
            let times: Vec<f64> = (0..n)
                .map(|i| i as f64 + rng.gen_range(-0.3..0.3))
                .collect();
            let rows: Vec<Vec<f64>> = (0..n)
                .map(|i| {
                    let s = i as f64 / (n - 1) as f64;
                    vec![
                        p0[0] + s * (p1[0] - p0[0]) + noise.sample(rng),
                        p0[1] + s * (p1[1] - p0[1]) + noise.sample(rng),
                    ]
                })
                .collect();
            Trial::from_rows(times, &rows).unwrap()
        })
        .collect()
}

/// Two separated horizontal bundles of five trials with 20 samples each
pub fn two_clusters(seed: u64) -> (Vec<Trial>, Vec<Trial>) {
    let mut rng = rng(seed);
    let a = line_bundle(&mut rng, &Bundle::horizontal(0.0), 5);
    let b = line_bundle(&mut rng, &Bundle::horizontal(10.0), 5);
    (a, b)
}

/// Rising 3D bundle: a 2D horizontal bundle lifted along z, with
/// independent noise on z
pub fn rising_bundle(seed: u64, count: usize) -> Vec<Trial> {
    let mut rng = rng(seed);
    let flat = line_bundle(&mut rng, &Bundle::horizontal(0.0), count);
    let lift = Normal::new(0.0, 0.4).unwrap();
    flat.iter()
        .map(|trial| {
            let positions = trial.positions();
            let rows: Vec<Vec<f64>> = (0..trial.len())
                .map(|i| {
                    let x = positions[(i, 0)];
                    vec![x, positions[(i, 1)], 0.5 * x + lift.sample(&mut rng)]
                })
                .collect();
            Trial::from_rows(trial.times().to_vec(), &rows).unwrap()
        })
        .collect()
}

/// Copy of `trial` with the given samples replaced by NaN
pub fn with_missing(trial: &Trial, missing: &[usize]) -> Trial {
    let mut positions = trial.positions().clone();
    for &i in missing {
        positions[(i, 1)] = f64::NAN;
    }
    Trial::new(trial.times().to_vec(), positions).unwrap()
}

/// Copy of `trial` with the given samples removed
pub fn without(trial: &Trial, removed: &[usize]) -> Trial {
    let keep: Vec<usize> = (0..trial.len()).filter(|i| !removed.contains(i)).collect();
    let times = keep.iter().map(|&i| trial.times()[i]).collect();
    let rows: Vec<Vec<f64>> = keep
        .iter()
        .map(|&i| trial.positions().row(i).iter().copied().collect())
        .collect();
    Trial::from_rows(times, &rows).unwrap()
}
