//! Query results
//!
//! Plain serialisable containers returned by the world queries.

use nalgebra::DMatrix;
use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

/// Expected trajectory of one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanResult {
    /// Condition label
    pub label: String,
    /// M x D points ordered from start to end of the trajectory
    pub points: DMatrix<f64>,
}

impl MeanResult {
    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Whether there are no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Spatial dimension
    #[inline]
    pub fn dimension(&self) -> usize {
        self.points.ncols()
    }
}

/// Log-likelihood field of one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityResult {
    /// Condition label
    pub label: String,
    /// Coordinate vector per axis
    pub axes: Vec<Array1<f64>>,
    /// Log-likelihood per node; axis `d` of the array is spatial axis `d`
    pub values: ArrayD<f64>,
}

impl DensityResult {
    /// Largest value in the field
    pub fn max(&self) -> f64 {
        self.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// One traced piece of a tube boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// K x D points in trace order
    pub points: DMatrix<f64>,
    /// Whether the piece is a closed loop (last point repeats the first)
    pub closed: bool,
}

impl Polyline {
    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Whether the piece has no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }
}

/// Confidence-region membership of one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeResult {
    /// Condition label
    pub label: String,
    /// Coordinate vector per axis
    pub axes: Vec<Array1<f64>>,
    /// Whether each node lies inside the tube
    pub inside: ArrayD<bool>,
    /// Boundary pieces in trace order
    pub boundary: Vec<Polyline>,
    /// Width in standard deviations
    pub sd_width: f64,
    /// Score threshold `-sd_width² / 2`
    pub threshold: f64,
}

impl TubeResult {
    /// Number of nodes inside the tube
    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|&&b| b).count()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
