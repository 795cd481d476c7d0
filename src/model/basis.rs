//! Basis functions on the unit time interval
//!
//! A parametric trajectory model writes each coordinate as a weighted sum of
//! `J` basis functions. Stacking D coordinates gives the block-diagonal
//! design matrix `H = I_D ⊗ Φ`, matching the dimension-major layout of
//! [`ResampledTrial::stacked`](crate::trajectory::ResampledTrial::stacked).

use nalgebra::DMatrix;

use super::config::{BasisConfig, BasisKind};

/// Evaluable basis of `count` functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    kind: BasisKind,
    count: usize,
}

impl Basis {
    /// Create a basis from its configuration
    pub fn new(config: BasisConfig) -> Self {
        Self {
            kind: config.kind,
            count: config.count,
        }
    }

    /// Number of functions per dimension (J)
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Value of basis function `j` at `t`
    pub fn value(&self, j: usize, t: f64) -> f64 {
        match self.kind {
            BasisKind::Gaussian => {
                let spacing = 1.0 / (self.count - 1) as f64;
                let centre = j as f64 * spacing;
                let z = (t - centre) / spacing;
                (-0.5 * z * z).exp()
            }
            BasisKind::Bernstein => {
                let n = (self.count - 1) as i32;
                let j_i = j as i32;
                binomial(self.count - 1, j) * t.powi(j_i) * (1.0 - t).powi(n - j_i)
            }
        }
    }

    /// Design matrix Φ with `Φ[i, j] = φ_j(times[i])`
    pub fn design(&self, times: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(times.len(), self.count, |i, j| self.value(j, times[i]))
    }

    /// Stacked design matrix `I_D ⊗ Φ` of shape `(D·N) x (D·J)`
    pub fn stacked_design(&self, times: &[f64], dimension: usize) -> DMatrix<f64> {
        DMatrix::<f64>::identity(dimension, dimension).kronecker(&self.design(times))
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(4, 0), 1.0);
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(5, 5), 1.0);
    }

    #[test]
    fn test_bernstein_partition_of_unity() {
        let basis = Basis::new(BasisConfig::new(BasisKind::Bernstein, 5));
        for &t in &[0.0, 0.13, 0.5, 0.99, 1.0] {
            let sum: f64 = (0..5).map(|j| basis.value(j, t)).sum();
            assert!((sum - 1.0).abs() < 1e-12, "t={} sum={}", t, sum);
        }
    }

    #[test]
    fn test_gaussian_peaks_at_centres() {
        let basis = Basis::new(BasisConfig::new(BasisKind::Gaussian, 3));
        assert_eq!(basis.value(0, 0.0), 1.0);
        assert_eq!(basis.value(1, 0.5), 1.0);
        assert_eq!(basis.value(2, 1.0), 1.0);
        assert!(basis.value(0, 1.0) < basis.value(2, 1.0));
    }

    #[test]
    fn test_stacked_design_is_block_diagonal() {
        let basis = Basis::new(BasisConfig::new(BasisKind::Bernstein, 3));
        let times = [0.0, 0.5, 1.0, 0.25];
        let h = basis.stacked_design(&times, 2);
        assert_eq!(h.shape(), (8, 6));

        let phi = basis.design(&times);
        assert_eq!(h.view((0, 0), (4, 3)), phi.view((0, 0), (4, 3)));
        assert_eq!(h.view((4, 3), (4, 3)), phi.view((0, 0), (4, 3)));
        assert!(h.view((0, 3), (4, 3)).iter().all(|&v| v == 0.0));
        assert!(h.view((4, 0), (4, 3)).iter().all(|&v| v == 0.0));
    }
}
