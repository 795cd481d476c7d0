//! Trials and the resampling step
//!
//! A [`Trial`] is one observed instance of a trajectory: strictly increasing
//! time stamps and one D-dimensional position per time stamp. Missing
//! samples are encoded as non-finite values and are only removed when the
//! trial is resampled ([`Trial::valid_samples`]).

use nalgebra::{DMatrix, DVector};

use crate::errors::ModelError;

/// One observed trajectory: `times[i]` is the time stamp of row `i` of
/// `positions`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    times: Vec<f64>,
    /// Samples x dimensions
    positions: DMatrix<f64>,
}

impl Trial {
    /// Create a trial from time stamps and a `samples x D` position matrix.
    ///
    /// # Errors
    /// * `DimensionMismatch` if the row count differs from the number of
    ///   time stamps
    /// * `InvalidTrial` if D is not 2 or 3, or the finite time stamps are
    ///   not strictly increasing
    pub fn new(times: Vec<f64>, positions: DMatrix<f64>) -> Result<Self, ModelError> {
        if positions.nrows() != times.len() {
            return Err(ModelError::DimensionMismatch {
                expected: times.len(),
                actual: positions.nrows(),
                context: "trial sample count".to_string(),
            });
        }

        let d = positions.ncols();
        if !(2..=3).contains(&d) {
            return Err(ModelError::InvalidTrial {
                description: format!("trials must be 2D or 3D, got {} columns", d),
            });
        }

        let mut previous: Option<f64> = None;
        for &t in times.iter().filter(|t| t.is_finite()) {
            if let Some(p) = previous {
                if t <= p {
                    return Err(ModelError::InvalidTrial {
                        description: format!(
                            "time must be strictly increasing ({} follows {})",
                            t, p
                        ),
                    });
                }
            }
            previous = Some(t);
        }

        Ok(Self { times, positions })
    }

    /// Create a trial from per-sample position rows.
    ///
    /// Every row must have the same length.
    pub fn from_rows(times: Vec<f64>, rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let d = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != d) {
            return Err(ModelError::DimensionMismatch {
                expected: d,
                actual: bad.len(),
                context: "trial row length".to_string(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(times, DMatrix::from_row_slice(rows.len(), d, &flat))
    }

    /// Spatial dimension D
    #[inline]
    pub fn dimension(&self) -> usize {
        self.positions.ncols()
    }

    /// Number of raw samples (including missing ones)
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the trial has no samples at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Raw time stamps
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Raw positions (samples x D)
    pub fn positions(&self) -> &DMatrix<f64> {
        &self.positions
    }

    /// Drop every sample whose time or any coordinate is non-finite.
    pub fn valid_samples(&self) -> ResampledTrial {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| {
                self.times[i].is_finite() && self.positions.row(i).iter().all(|v| v.is_finite())
            })
            .collect();

        let d = self.dimension();
        let times = keep.iter().map(|&i| self.times[i]).collect();
        let positions = DMatrix::from_fn(keep.len(), d, |r, c| self.positions[(keep[r], c)]);

        ResampledTrial { times, positions }
    }
}

/// Infer the dimensionality of a condition from its first trial.
pub fn infer_dimension(first: &Trial) -> usize {
    first.dimension()
}

/// Check a trial against an already inferred dimensionality.
pub fn validate_dimension(trial: &Trial, dimension: usize) -> bool {
    trial.dimension() == dimension
}

/// A trial with missing samples removed, optionally rescaled onto the
/// shared [0, 1] parametrisation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledTrial {
    /// Strictly increasing time stamps
    pub times: Vec<f64>,
    /// Samples x D
    pub positions: DMatrix<f64>,
}

impl ResampledTrial {
    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether no samples survived masking
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Spatial dimension D
    #[inline]
    pub fn dimension(&self) -> usize {
        self.positions.ncols()
    }

    /// Dimension-major stacking `[x_1..x_N, y_1..y_N, (z_1..z_N)]`.
    pub fn stacked(&self) -> DVector<f64> {
        // DMatrix storage is column-major, which is exactly this layout
        DVector::from_column_slice(self.positions.as_slice())
    }

    /// Piecewise-linear interpolation of every coordinate at `at`,
    /// clamped to the first/last sample outside the sampled range.
    ///
    /// Returns a `at.len() x D` matrix. The trial must not be empty.
    pub fn interpolate(&self, at: &[f64]) -> DMatrix<f64> {
        let d = self.dimension();
        let n = self.len();
        let mut out = DMatrix::zeros(at.len(), d);

        for (row, &t) in at.iter().enumerate() {
            if n == 1 || t <= self.times[0] {
                out.row_mut(row).copy_from(&self.positions.row(0));
                continue;
            }
            if t >= self.times[n - 1] {
                out.row_mut(row).copy_from(&self.positions.row(n - 1));
                continue;
            }

            // First sample strictly after t; exists because t < times[n-1]
            let hi = self.times.partition_point(|&s| s <= t);
            let lo = hi - 1;
            let w = (t - self.times[lo]) / (self.times[hi] - self.times[lo]);
            for c in 0..d {
                let a = self.positions[(lo, c)];
                let b = self.positions[(hi, c)];
                out[(row, c)] = a + w * (b - a);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_trial() -> Trial {
        Trial::from_rows(
            vec![0.0, 1.0, 2.0],
            &[vec![0.0, 0.0], vec![1.0, 2.0], vec![2.0, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = Trial::new(vec![0.0, 1.0], DMatrix::zeros(3, 2)).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn test_new_rejects_unsupported_dimension() {
        let err = Trial::new(vec![0.0, 1.0], DMatrix::zeros(2, 4)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidTrial { .. }));
    }

    #[test]
    fn test_new_rejects_non_increasing_time() {
        let err = Trial::new(vec![0.0, 1.0, 1.0], DMatrix::zeros(3, 2)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidTrial { .. }));
    }

    #[test]
    fn test_missing_time_ignored_by_monotonic_check() {
        let trial = Trial::new(vec![0.0, f64::NAN, 2.0], DMatrix::zeros(3, 2));
        assert!(trial.is_ok());
    }

    #[test]
    fn test_from_rows_ragged() {
        let err = Trial::from_rows(vec![0.0, 1.0], &[vec![0.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_valid_samples_masks_non_finite() {
        let trial = Trial::from_rows(
            vec![0.0, 1.0, f64::NAN, 3.0],
            &[
                vec![0.0, 0.0],
                vec![1.0, f64::INFINITY],
                vec![2.0, 2.0],
                vec![3.0, 3.0],
            ],
        )
        .unwrap();

        let valid = trial.valid_samples();
        assert_eq!(valid.times, vec![0.0, 3.0]);
        assert_eq!(valid.positions.nrows(), 2);
        assert_eq!(valid.positions[(1, 1)], 3.0);
    }

    #[test]
    fn test_valid_samples_all_missing() {
        let trial = Trial::from_rows(vec![0.0, 1.0], &[vec![f64::NAN, 0.0], vec![0.0, f64::NAN]])
            .unwrap();
        assert!(trial.valid_samples().is_empty());
    }

    #[test]
    fn test_dimension_protocol() {
        let trial = line_trial();
        let d = infer_dimension(&trial);
        assert_eq!(d, 2);
        assert!(validate_dimension(&trial, d));
        assert!(!validate_dimension(&trial, 3));
    }

    #[test]
    fn test_interpolate_inside_and_clamped() {
        let valid = line_trial().valid_samples();
        let out = valid.interpolate(&[-1.0, 0.5, 1.5, 5.0]);
        assert_eq!(out.nrows(), 4);
        assert_eq!(out[(0, 0)], 0.0);
        assert!((out[(1, 0)] - 0.5).abs() < 1e-12);
        assert!((out[(1, 1)] - 1.0).abs() < 1e-12);
        assert!((out[(2, 1)] - 3.0).abs() < 1e-12);
        assert_eq!(out[(3, 1)], 4.0);
    }

    #[test]
    fn test_interpolate_hits_samples_exactly() {
        let valid = line_trial().valid_samples();
        let out = valid.interpolate(&[1.0]);
        assert_eq!(out[(0, 0)], 1.0);
        assert_eq!(out[(0, 1)], 2.0);
    }

    #[test]
    fn test_stacked_is_dimension_major() {
        let valid = line_trial().valid_samples();
        let y = valid.stacked();
        assert_eq!(y.as_slice(), &[0.0, 1.0, 2.0, 0.0, 2.0, 4.0]);
    }
}
