//! Axis-aligned bounds of trajectory data

use serde::{Deserialize, Serialize};

use super::trial::ResampledTrial;

/// Per-axis `[lower, upper]` bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Lower bound per axis
    pub lower: Vec<f64>,
    /// Upper bound per axis
    pub upper: Vec<f64>,
}

impl Outline {
    /// An empty outline that any point will widen
    pub fn empty(dimension: usize) -> Self {
        Self {
            lower: vec![f64::INFINITY; dimension],
            upper: vec![f64::NEG_INFINITY; dimension],
        }
    }

    /// Bounds of every sample of the given trials
    pub fn from_trials<'a>(dimension: usize, trials: impl IntoIterator<Item = &'a ResampledTrial>) -> Self {
        let mut outline = Self::empty(dimension);
        for trial in trials {
            for row in trial.positions.row_iter() {
                outline.include(row.iter().copied());
            }
        }
        outline
    }

    /// Number of axes
    #[inline]
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Widen the bounds to include a point
    pub fn include(&mut self, point: impl IntoIterator<Item = f64>) {
        for (d, v) in point.into_iter().enumerate().take(self.dimension()) {
            self.lower[d] = self.lower[d].min(v);
            self.upper[d] = self.upper[d].max(v);
        }
    }

    /// Smallest outline containing both
    pub fn union(&self, other: &Outline) -> Outline {
        Outline {
            lower: self
                .lower
                .iter()
                .zip(&other.lower)
                .map(|(a, b)| a.min(*b))
                .collect(),
            upper: self
                .upper
                .iter()
                .zip(&other.upper)
                .map(|(a, b)| a.max(*b))
                .collect(),
        }
    }

    /// `upper - lower` for one axis
    #[inline]
    pub fn span(&self, axis: usize) -> f64 {
        self.upper[axis] - self.lower[axis]
    }

    /// Span used for normalisation: a zero (or invalid) span counts as 1
    pub fn scale(&self, axis: usize) -> f64 {
        let span = self.span(axis);
        if span.is_finite() && span > 0.0 {
            span
        } else {
            1.0
        }
    }

    /// Largest normalisation scale over all axes
    pub fn max_scale(&self) -> f64 {
        (0..self.dimension())
            .map(|d| self.scale(d))
            .fold(0.0, f64::max)
    }

    /// Grow each axis by `fraction * span` on both sides.
    ///
    /// Axes with zero span are widened by 0.5 on both sides so the result
    /// always has positive extent.
    pub fn padded(&self, fraction: f64) -> Outline {
        let mut lower = self.lower.clone();
        let mut upper = self.upper.clone();
        for d in 0..self.dimension() {
            let span = self.span(d);
            let pad = if span > 0.0 { fraction * span } else { 0.5 };
            lower[d] -= pad;
            upper[d] += pad;
        }
        Outline { lower, upper }
    }

    /// Whether a point lies inside (inclusive)
    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .enumerate()
            .all(|(d, &v)| v >= self.lower[d] && v <= self.upper[d])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn test_from_trials() {
        let a = ResampledTrial {
            times: vec![0.0, 1.0],
            positions: DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 2.0, 3.0]),
        };
        let b = ResampledTrial {
            times: vec![0.0, 1.0],
            positions: DMatrix::from_row_slice(2, 2, &[-1.0, 5.0, 0.5, 0.5]),
        };
        let outline = Outline::from_trials(2, [&a, &b]);
        assert_eq!(outline.lower, vec![-1.0, 0.5]);
        assert_eq!(outline.upper, vec![2.0, 5.0]);
        assert!(outline.contains(&[0.0, 1.0]));
        assert!(!outline.contains(&[3.0, 1.0]));
    }

    #[test]
    fn test_padded_handles_zero_span() {
        let outline = Outline {
            lower: vec![0.0, 2.0],
            upper: vec![10.0, 2.0],
        };
        let padded = outline.padded(0.1);
        assert_eq!(padded.lower, vec![-1.0, 1.5]);
        assert_eq!(padded.upper, vec![11.0, 2.5]);
        assert_eq!(outline.scale(1), 1.0);
        assert_eq!(outline.max_scale(), 10.0);
    }

    #[test]
    fn test_union() {
        let a = Outline {
            lower: vec![0.0, 0.0],
            upper: vec![1.0, 1.0],
        };
        let b = Outline {
            lower: vec![-1.0, 0.5],
            upper: vec![0.5, 3.0],
        };
        let u = a.union(&b);
        assert_eq!(u.lower, vec![-1.0, 0.0]);
        assert_eq!(u.upper, vec![1.0, 3.0]);
    }
}
