//! Confidence tubes
//!
//! The tube at width `k` is the set of points whose squared Mahalanobis
//! distance to the swept model is at most `k²`. The swept model is the union
//! of the cell ellipses and, between consecutive cells, the ellipse swept
//! linearly from one centre to the next with the averaged covariance.
//!
//! For a segment from `c0` to `c1 = c0 + d` with precision `Λ`, the closest
//! sweep parameter to `y` is
//!
//! ```text
//! t* = clamp(dᵀΛ(y - c0) / dᵀΛd, 0, 1)
//! ```
//!
//! Membership is reported through the peak-normalised log-likelihood
//! `score(y) = -½ min d²(y)` against the threshold `-½ k²`.

use nalgebra::{DMatrix, DVector};

use crate::common::linalg::{mahalanobis_squared, spd_inverse};
use crate::errors::ModelError;
use crate::model::FittedModel;

use super::contour::trace_boundaries;
use super::grid::Grid;
use super::output::TubeResult;

/// Linear sweep between two consecutive cells
#[derive(Debug, Clone)]
struct Segment {
    start: DVector<f64>,
    direction: DVector<f64>,
    precision: DMatrix<f64>,
    /// dᵀΛd
    length_squared: f64,
}

/// Precomputed distance evaluator for one model
#[derive(Debug, Clone)]
pub struct SweptTube {
    cells: Vec<(DVector<f64>, DMatrix<f64>)>,
    segments: Vec<Segment>,
}

impl SweptTube {
    /// Precompute centres, precisions and segment sweeps of `model`.
    pub fn new(model: &FittedModel) -> Result<Self, ModelError> {
        let cells: Vec<(DVector<f64>, DMatrix<f64>)> = model
            .cells()
            .iter()
            .map(|c| (c.centre.clone(), c.precision().clone()))
            .collect();

        let segments = model
            .cells()
            .windows(2)
            .map(|pair| {
                let averaged = (&pair[0].covariance + &pair[1].covariance) * 0.5;
                let precision = spd_inverse(&averaged).ok_or_else(|| {
                    ModelError::fit("averaged cell covariance is not positive definite")
                })?;
                let direction = &pair[1].centre - &pair[0].centre;
                let length_squared = direction.dot(&(&precision * &direction));
                Ok(Segment {
                    start: pair[0].centre.clone(),
                    direction,
                    precision,
                    length_squared,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Self { cells, segments })
    }

    /// Minimum squared Mahalanobis distance from `point` to the swept model
    pub fn distance_squared(&self, point: &DVector<f64>) -> f64 {
        let cell_min = self
            .cells
            .iter()
            .map(|(centre, precision)| mahalanobis_squared(&(point - centre), precision))
            .fold(f64::INFINITY, f64::min);

        self.segments
            .iter()
            .map(|s| {
                let offset = point - &s.start;
                let t = if s.length_squared > 0.0 {
                    (s.direction.dot(&(&s.precision * &offset)) / s.length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                mahalanobis_squared(&(offset - &s.direction * t), &s.precision)
            })
            .fold(cell_min, f64::min)
    }

    /// Peak-normalised log-likelihood `-½ min d²`
    #[inline]
    pub fn score(&self, point: &DVector<f64>) -> f64 {
        -0.5 * self.distance_squared(point)
    }
}

/// Score threshold for a width in standard deviations
#[inline]
pub fn threshold(sd_width: f64) -> f64 {
    -0.5 * sd_width * sd_width
}

/// Tube membership of `model` on `grid` at `sd_width` standard deviations,
/// with its traced boundary.
///
/// # Errors
/// `InvalidQuery` if `sd_width` is not finite and positive.
pub fn extract_tube(model: &FittedModel, sd_width: f64, grid: &Grid) -> Result<TubeResult, ModelError> {
    if !(sd_width.is_finite() && sd_width > 0.0) {
        return Err(ModelError::query(format!(
            "sd_width must be finite and positive, got {}",
            sd_width
        )));
    }
    if grid.dimension() != model.dimension() {
        return Err(ModelError::DimensionMismatch {
            expected: model.dimension(),
            actual: grid.dimension(),
            context: "tube grid".to_string(),
        });
    }

    let tube = SweptTube::new(model)?;
    let level = threshold(sd_width);
    let inside = grid.map_nodes(|point| tube.score(point) >= level)?;
    let boundary = trace_boundaries(&inside, grid.axes())?;

    log::debug!(
        "Tube for '{}' at {} sd: {} of {} nodes inside, {} boundary pieces",
        model.label(),
        sd_width,
        inside.iter().filter(|&&b| b).count(),
        grid.node_count(),
        boundary.len()
    );

    Ok(TubeResult {
        label: model.label().to_string(),
        axes: grid.axes().to_vec(),
        inside,
        boundary,
        sd_width,
        threshold: level,
    })
}
