//! Fitted per-condition models
//!
//! A [`FittedModel`] is the immutable result of fitting one condition. It
//! holds the joint Gaussian over the `M` cell positions (`mu_y`, `sig_y`,
//! dimension-major) and the `M` marginal cells derived from it, each with a
//! repaired SPD covariance and a cached precision matrix.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::common::constants::{DEGENERATE_VARIANCE, SPD_ABSOLUTE_FLOOR};
use crate::common::linalg::{
    cholesky_log_determinant, log_sum_exp, mahalanobis_squared, nearest_spd, sqrt_factor,
};
use crate::errors::ModelError;
use crate::trajectory::{Outline, PreparedCondition};

use super::config::ModelType;

/// One Gaussian along the modelled trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianCell {
    /// Cell centre (D)
    pub centre: DVector<f64>,
    /// Cell covariance (D x D, SPD)
    pub covariance: DMatrix<f64>,
    precision: DMatrix<f64>,
    log_det: f64,
}

impl GaussianCell {
    /// Create a cell; the covariance must be positive definite.
    pub fn new(centre: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self, ModelError> {
        let chol = covariance.clone().cholesky().ok_or_else(|| {
            ModelError::fit("cell covariance is not positive definite")
        })?;
        let log_det = cholesky_log_determinant(&chol.l());
        let precision = chol.inverse();
        Ok(Self {
            centre,
            covariance,
            precision,
            log_det,
        })
    }

    /// Inverse covariance
    pub fn precision(&self) -> &DMatrix<f64> {
        &self.precision
    }

    /// Spatial dimension
    #[inline]
    pub fn dimension(&self) -> usize {
        self.centre.len()
    }

    /// Squared Mahalanobis distance of `point` from the centre
    pub fn mahalanobis_squared(&self, point: &DVector<f64>) -> f64 {
        mahalanobis_squared(&(point - &self.centre), &self.precision)
    }

    /// Log-density of the cell Gaussian at `point`
    pub fn log_density(&self, point: &DVector<f64>) -> f64 {
        let d = self.dimension() as f64;
        -0.5 * (d * (2.0 * PI).ln() + self.log_det + self.mahalanobis_squared(point))
    }
}

/// Fitted model of one condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    label: String,
    dimension: usize,
    model_type: ModelType,
    /// Stacked mean `[x_1..x_M, y_1..y_M, (z_1..z_M)]`
    mu_y: DVector<f64>,
    /// Joint covariance of `mu_y`
    sig_y: DMatrix<f64>,
    cells: Vec<GaussianCell>,
    outline: Outline,
    time_range: (f64, f64),
    trial_count: usize,
}

impl FittedModel {
    /// Build a model from moments computed on the normalised data of
    /// `prepared`, mapping them back to the original units.
    ///
    /// # Errors
    /// `ModelFit` if the normalised covariance carries no variance at all,
    /// or a cell covariance cannot be repaired.
    pub(crate) fn from_normalized(
        label: &str,
        model_type: ModelType,
        prepared: &PreparedCondition,
        mu_norm: DVector<f64>,
        sig_norm: DMatrix<f64>,
    ) -> Result<Self, ModelError> {
        let dimension = prepared.dimension;
        let m = mu_norm.len() / dimension;

        if !mu_norm.iter().all(|v| v.is_finite()) || !sig_norm.iter().all(|v| v.is_finite()) {
            return Err(ModelError::fit(format!(
                "condition '{}': non-finite moments",
                label
            )));
        }
        if sig_norm.trace() <= DEGENERATE_VARIANCE {
            return Err(ModelError::fit(format!(
                "condition '{}': degenerate covariance (trials are identical)",
                label
            )));
        }

        let outline = &prepared.outline;
        let scales = DVector::from_fn(dimension * m, |i, _| outline.scale(i / m));
        let offsets = DVector::from_fn(dimension * m, |i, _| outline.lower[i / m]);

        let mu_y = mu_norm.component_mul(&scales) + offsets;
        let s = DMatrix::from_diagonal(&scales);
        let sig_y = &s * sig_norm * &s;

        let floor = SPD_ABSOLUTE_FLOOR * outline.max_scale().powi(2);
        let cells = (0..m)
            .map(|k| {
                let centre = DVector::from_fn(dimension, |d, _| mu_y[k + d * m]);
                let block =
                    DMatrix::from_fn(dimension, dimension, |r, c| sig_y[(k + r * m, k + c * m)]);
                GaussianCell::new(centre, nearest_spd(&block, floor))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label: label.to_string(),
            dimension,
            model_type,
            mu_y,
            sig_y,
            cells,
            outline: outline.clone(),
            time_range: prepared.time_range,
            trial_count: prepared.trials.len(),
        })
    }

    /// Condition label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Spatial dimension D
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Strategy that produced this model
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Number of cells M
    #[inline]
    pub fn component_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells ordered from start to end of the parametrisation
    pub fn cells(&self) -> &[GaussianCell] {
        &self.cells
    }

    /// Stacked mean vector (length D·M, dimension-major)
    pub fn mean_vector(&self) -> &DVector<f64> {
        &self.mu_y
    }

    /// Joint covariance (D·M x D·M)
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.sig_y
    }

    /// Bounds of the training samples
    pub fn training_outline(&self) -> &Outline {
        &self.outline
    }

    /// `(min, max)` of the training time stamps
    pub fn time_range(&self) -> (f64, f64) {
        self.time_range
    }

    /// Number of trials the model was fitted on
    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    /// Cell centres as an `M x D` matrix
    pub fn mean_points(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.component_count(), self.dimension, self.mu_y.as_slice())
    }

    /// Log-likelihood of a point under the equal-weight cell mixture
    /// `(1/M) Σ N(y; c_m, A_m)`.
    pub fn log_likelihood(&self, point: &DVector<f64>) -> f64 {
        let logs: Vec<f64> = self.cells.iter().map(|c| c.log_density(point)).collect();
        log_sum_exp(&logs) - (self.cells.len() as f64).ln()
    }

    /// Bounding box of every cell ellipse at `sd_width` standard deviations.
    ///
    /// The half extent of an ellipse along axis `d` is `sd_width * sqrt(A_dd)`.
    pub fn confidence_outline(&self, sd_width: f64) -> Result<Outline, ModelError> {
        if !(sd_width.is_finite() && sd_width > 0.0) {
            return Err(ModelError::query(format!(
                "sd_width must be finite and positive, got {}",
                sd_width
            )));
        }
        let mut outline = Outline::empty(self.dimension);
        for cell in &self.cells {
            for d in 0..self.dimension {
                let half = sd_width * cell.covariance[(d, d)].sqrt();
                let mut lo = cell.centre.clone();
                let mut hi = cell.centre.clone();
                lo[d] -= half;
                hi[d] += half;
                outline.include(lo.iter().copied());
                outline.include(hi.iter().copied());
            }
        }
        Ok(outline)
    }

    /// Draw `n` trajectories from the joint Gaussian.
    ///
    /// Each sample is an `M x D` matrix of positions. The same seed always
    /// reproduces the same samples.
    pub fn sample(&self, n: usize, seed: u64) -> Vec<DMatrix<f64>> {
        let factor = sqrt_factor(&self.sig_y);
        let mut rng = StdRng::seed_from_u64(seed);
        let len = self.mu_y.len();

        (0..n)
            .map(|_| {
                let z = DVector::<f64>::from_fn(len, |_, _| StandardNormal.sample(&mut rng));
                let y = &self.mu_y + &factor * z;
                DMatrix::from_column_slice(self.component_count(), self.dimension, y.as_slice())
            })
            .collect()
    }
}
