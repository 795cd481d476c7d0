//! Resampling model
//!
//! Every normalised trial is linearly interpolated at `M` evenly spaced
//! parameter values, stacked dimension-major, and the sample mean and
//! population covariance of the stacked vectors form the joint Gaussian.

use nalgebra::{DMatrix, DVector};

use crate::common::linalg::{sample_moments, unit_linspace};
use crate::trajectory::PreparedCondition;

/// Fit the joint Gaussian over `component_count` cells in normalised units.
///
/// `prepared` holds at least two non-empty trials.
pub fn fit(prepared: &PreparedCondition, component_count: usize) -> (DVector<f64>, DMatrix<f64>) {
    let at = unit_linspace(component_count);

    let stacked: Vec<DVector<f64>> = prepared
        .trials
        .iter()
        .map(|trial| {
            let points = trial.interpolate(&at);
            DVector::from_column_slice(points.as_slice())
        })
        .collect();

    sample_moments(&stacked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::ResampledTrial;

    fn prepared(trials: Vec<ResampledTrial>) -> PreparedCondition {
        PreparedCondition {
            dimension: 2,
            trials,
            outline: crate::trajectory::Outline {
                lower: vec![0.0, 0.0],
                upper: vec![1.0, 1.0],
            },
            time_range: (0.0, 1.0),
            skipped: vec![],
        }
    }

    #[test]
    fn test_two_parallel_lines() {
        // y = 0 and y = 1, both running x = 0..1
        let a = ResampledTrial {
            times: vec![0.0, 1.0],
            positions: DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 0.0]),
        };
        let b = ResampledTrial {
            times: vec![0.0, 1.0],
            positions: DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 1.0]),
        };

        let (mu, sig) = fit(&prepared(vec![a, b]), 3);
        assert_eq!(mu.len(), 6);
        // x block
        assert!((mu[1] - 0.5).abs() < 1e-12);
        // y block
        for m in 0..3 {
            assert!((mu[3 + m] - 0.5).abs() < 1e-12);
            assert!((sig[(3 + m, 3 + m)] - 0.25).abs() < 1e-12);
            assert!(sig[(m, m)].abs() < 1e-12);
        }
    }

    #[test]
    fn test_unequal_sampling() {
        let a = ResampledTrial {
            times: vec![0.0, 0.5, 1.0],
            positions: DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 0.5, 0.0, 1.0, 0.0]),
        };
        let b = ResampledTrial {
            times: vec![0.0, 1.0],
            positions: DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 0.0]),
        };
        let (mu, sig) = fit(&prepared(vec![a, b]), 5);
        assert!((mu[2] - 0.5).abs() < 1e-12);
        assert!(sig.iter().all(|v| v.abs() < 1e-12));
    }
}
