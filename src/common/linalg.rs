//! Linear algebra utilities
//!
//! Mahalanobis distances, covariance repair and least-squares helpers shared
//! by the model builders and the query evaluators.

use nalgebra::{DMatrix, DVector};

use super::constants::{SPD_RELATIVE_FLOOR, SVD_TOLERANCE};

/// Squared Mahalanobis distance `diffᵀ Λ diff` for a precision matrix `Λ`
#[inline]
pub fn mahalanobis_squared(diff: &DVector<f64>, precision: &DMatrix<f64>) -> f64 {
    diff.dot(&(precision * diff))
}

/// Log-determinant from a lower Cholesky factor: `2 * sum(ln L_ii)`
pub fn cholesky_log_determinant(l: &DMatrix<f64>) -> f64 {
    2.0 * l.diagonal().iter().map(|v| v.ln()).sum::<f64>()
}

/// Compute log-sum-exp for numerical stability
///
/// Computes log(sum(exp(x))) in a numerically stable way
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }

    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() && max_val < 0.0 {
        return f64::NEG_INFINITY;
    }

    let sum: f64 = values.iter().map(|v| (v - max_val).exp()).sum();
    max_val + sum.ln()
}

/// Make matrix symmetric
///
/// Ensures a matrix is symmetric by averaging with its transpose
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (matrix + matrix.transpose())
}

/// Nearest symmetric positive definite matrix
///
/// Symmetrises the input and clips its eigenvalues from below at
/// `max(min_eigenvalue, SPD_RELATIVE_FLOOR * largest eigenvalue)`. The
/// result always admits a Cholesky factorisation as long as
/// `min_eigenvalue > 0`.
pub fn nearest_spd(matrix: &DMatrix<f64>, min_eigenvalue: f64) -> DMatrix<f64> {
    let sym = symmetrize(matrix);
    let eigen = sym.symmetric_eigen();

    let largest = eigen
        .eigenvalues
        .iter()
        .cloned()
        .fold(0.0_f64, f64::max);
    let floor = min_eigenvalue.max(largest * SPD_RELATIVE_FLOOR);

    let clipped = eigen.eigenvalues.map(|v| if v.is_finite() { v.max(floor) } else { floor });
    let v = &eigen.eigenvectors;
    let rebuilt = v * DMatrix::from_diagonal(&clipped) * v.transpose();

    symmetrize(&rebuilt)
}

/// Least-squares solve `A x = b` through the SVD pseudo-inverse
///
/// Returns `None` if the decomposition fails to produce a solution.
pub fn least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    a.clone().svd(true, true).solve(b, SVD_TOLERANCE).ok()
}

/// Matrix square-root factor `U * sqrt(S)` of a symmetric PSD matrix
///
/// Used to draw correlated samples: `mu + F z` with `z ~ N(0, I)` has
/// covariance `F F^T = sigma`. Negative eigenvalues from round-off are
/// clamped to zero.
pub fn sqrt_factor(sigma: &DMatrix<f64>) -> DMatrix<f64> {
    let eigen = symmetrize(sigma).symmetric_eigen();
    let roots = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
    &eigen.eigenvectors * DMatrix::from_diagonal(&roots)
}

/// Mean and population covariance (divided by `n`) of a set of vectors.
///
/// All vectors must have the same length; `samples` must not be empty.
pub fn sample_moments(samples: &[DVector<f64>]) -> (DVector<f64>, DMatrix<f64>) {
    let n = samples.len() as f64;
    let len = samples[0].len();

    let mut mean = DVector::zeros(len);
    for s in samples {
        mean += s;
    }
    mean /= n;

    let mut cov = DMatrix::zeros(len, len);
    for s in samples {
        let diff = s - &mean;
        cov += &diff * diff.transpose();
    }
    cov /= n;

    (mean, cov)
}

/// `n` evenly spaced values from 0 to 1 inclusive; `[0.0]` for `n == 1`
pub fn unit_linspace(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

/// Invert a symmetric positive definite matrix through Cholesky
pub fn spd_inverse(matrix: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    matrix.clone().cholesky().map(|chol| chol.inverse())
}
