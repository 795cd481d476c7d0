//! Queries against fitted models.
//!
//! - [`Grid`] - regular evaluation grid shared by the field queries
//! - [`evaluate`] - log-likelihood field
//! - [`extract_tube`] - confidence-tube membership and boundary
//! - [`extract_mean`] - mean trajectory

pub mod contour;
pub mod density;
pub mod grid;
pub mod mean;
pub mod output;
pub mod tube;

pub use contour::trace_boundaries;
pub use density::evaluate;
pub use grid::Grid;
pub use mean::extract_mean;
pub use output::{DensityResult, MeanResult, Polyline, TubeResult};
pub use tube::{extract_tube, SweptTube};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{build, FittedModel, ModelConfig};
    use crate::trajectory::{Condition, Trial};

    /// Offsets across the bundle; the two patterns are zero-mean and
    /// orthogonal, so x and y stay uncorrelated within every cell.
    const ACROSS: [f64; 5] = [-2.0, -1.0, 0.0, 1.0, 2.0];
    const SHIFT: [f64; 5] = [2.0, -1.0, -2.0, -1.0, 2.0];

    /// Five roughly horizontal lines around `y = offset`, x from 0 to 10
    pub fn straight_bundle(label: &str, offset: f64) -> FittedModel {
        let trials = (0..5)
            .map(|k| {
                let spread = 0.5 * ACROSS[k];
                let shift = 0.15 * SHIFT[k];
                let times: Vec<f64> = (0..20).map(|i| i as f64).collect();
                let rows: Vec<Vec<f64>> = times
                    .iter()
                    .map(|&t| {
                        let s = t / 19.0;
                        vec![
                            shift + 10.0 * s,
                            offset + spread + 0.05 * (3.0 * s + k as f64).sin(),
                        ]
                    })
                    .collect();
                Trial::from_rows(times, &rows).unwrap()
            })
            .collect();

        let condition = Condition::new(label, trials).unwrap();
        build(&condition, 2, &ModelConfig::resampling(10)).unwrap()
    }
}
