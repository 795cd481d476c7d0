//! Regular evaluation grids
//!
//! A [`Grid`] is one strictly increasing coordinate vector per axis. Node
//! values are stored in `ndarray` arrays whose axis `d` is spatial axis `d`,
//! so `values[[i, j]]` belongs to the point `(x_i, y_j)`.

use nalgebra::DVector;
use ndarray::{Array1, ArrayD, IxDyn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::errors::ModelError;
use crate::trajectory::Outline;

/// Regular grid over a padded outline
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    axes: Vec<Array1<f64>>,
}

impl Grid {
    /// Grid with `resolution[d]` nodes on axis `d`, spanning `outline`
    /// widened by `padding` times its span on each side.
    ///
    /// # Errors
    /// * `DimensionMismatch` if `resolution` does not have one entry per axis
    /// * `Configuration` if any axis has fewer than 2 nodes, the padding is
    ///   negative, or the outline is not finite
    pub fn new(outline: &Outline, resolution: &[usize], padding: f64) -> Result<Self, ModelError> {
        if resolution.len() != outline.dimension() {
            return Err(ModelError::DimensionMismatch {
                expected: outline.dimension(),
                actual: resolution.len(),
                context: "grid resolution axes".to_string(),
            });
        }
        if let Some(&n) = resolution.iter().find(|&&n| n < 2) {
            return Err(ModelError::config(format!(
                "grid resolution must be at least 2 per axis, got {}",
                n
            )));
        }
        if !(padding >= 0.0) {
            return Err(ModelError::config(format!(
                "grid padding must be non-negative, got {}",
                padding
            )));
        }
        if outline
            .lower
            .iter()
            .chain(&outline.upper)
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::config("grid outline is not finite"));
        }

        let padded = outline.padded(padding);
        let axes = resolution
            .iter()
            .enumerate()
            .map(|(d, &n)| Array1::linspace(padded.lower[d], padded.upper[d], n))
            .collect();
        Ok(Self { axes })
    }

    /// Coordinate vector of every axis
    pub fn axes(&self) -> &[Array1<f64>] {
        &self.axes
    }

    /// Number of axes
    #[inline]
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// Nodes per axis
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.len()).collect()
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        self.axes.iter().map(|a| a.len()).product()
    }

    /// Coordinates of the node at a multi-index
    pub fn point(&self, index: &[usize]) -> DVector<f64> {
        DVector::from_iterator(
            self.axes.len(),
            self.axes.iter().zip(index).map(|(axis, &i)| axis[i]),
        )
    }

    /// Multi-index of the node closest to `point`
    pub fn nearest_index(&self, point: &[f64]) -> Vec<usize> {
        self.axes
            .iter()
            .zip(point)
            .map(|(axis, &v)| {
                let n = axis.len();
                let step = (axis[n - 1] - axis[0]) / (n - 1) as f64;
                let i = ((v - axis[0]) / step).round();
                i.clamp(0.0, (n - 1) as f64) as usize
            })
            .collect()
    }

    /// Evaluate `f` at every node, in standard (row-major) layout.
    ///
    /// Nodes are evaluated in parallel when the `rayon` feature is enabled.
    pub fn map_nodes<T, F>(&self, f: F) -> Result<ArrayD<T>, ModelError>
    where
        T: Send,
        F: Fn(&DVector<f64>) -> T + Sync + Send,
    {
        let shape = self.shape();
        let count = self.node_count();
        let eval = |flat: usize| f(&self.point(&unravel(flat, &shape)));

        #[cfg(feature = "rayon")]
        let values: Vec<T> = (0..count).into_par_iter().map(eval).collect();

        #[cfg(not(feature = "rayon"))]
        let values: Vec<T> = (0..count).map(eval).collect();

        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| ModelError::query(format!("grid shape error: {}", e)))
    }
}

/// Row-major multi-index of a flat node index
fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for d in (0..shape.len()).rev() {
        index[d] = flat % shape[d];
        flat /= shape[d];
    }
    index
}
