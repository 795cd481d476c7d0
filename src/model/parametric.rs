//! Parametric model
//!
//! Each trial is represented as `y_n = H_n w_n + ε` with `H_n = I_D ⊗ Φ(t_n)`.
//! The weight distribution `N(mu_w, Σ_w)` is estimated either per trial by
//! least squares or jointly by expectation maximisation, and projected onto
//! the cell grid with `H_p = I_D ⊗ Φ(linspace(0, 1, M))`:
//!
//! ```text
//! mu_y  = H_p mu_w
//! sig_y = H_p Σ_w H_p^T
//! ```

use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

use crate::common::constants::{EM_MIN_NOISE_VARIANCE, EM_MIN_WEIGHT_VARIANCE};
use crate::common::linalg::{
    cholesky_log_determinant, least_squares, nearest_spd, sample_moments, unit_linspace,
};
use crate::errors::ModelError;
use crate::trajectory::PreparedCondition;

use super::basis::Basis;
use super::config::{EmConfig, Estimator};

/// Fit the joint Gaussian over `component_count` cells in normalised units.
pub fn fit(
    prepared: &PreparedCondition,
    component_count: usize,
    basis: &Basis,
    estimator: Estimator,
    em: &EmConfig,
) -> Result<(DVector<f64>, DMatrix<f64>), ModelError> {
    let (mu_w, sig_w) = match estimator {
        Estimator::MaximumLikelihood => maximum_likelihood(prepared, basis)?,
        Estimator::ExpectationMaximization => expectation_maximization(prepared, basis, em)?,
    };

    let hp = basis.stacked_design(&unit_linspace(component_count), prepared.dimension);
    let mu_y = &hp * mu_w;
    let sig_y = &hp * sig_w * hp.transpose();
    Ok((mu_y, sig_y))
}

/// Least-squares weights per trial, then their sample moments.
pub fn maximum_likelihood(
    prepared: &PreparedCondition,
    basis: &Basis,
) -> Result<(DVector<f64>, DMatrix<f64>), ModelError> {
    let weights = prepared
        .trials
        .iter()
        .enumerate()
        .map(|(i, trial)| {
            let h = basis.stacked_design(&trial.times, prepared.dimension);
            least_squares(&h, &trial.stacked())
                .ok_or_else(|| ModelError::fit(format!("least squares failed for trial {}", i)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sample_moments(&weights))
}

/// Sufficient statistics of one trial for the EM iteration
struct TrialStats {
    hth: DMatrix<f64>,
    hty: DVector<f64>,
    yty: f64,
    observations: usize,
}

/// Expectation maximisation over a shared weight prior and noise precision.
///
/// Starts from `mu_w = 0`, `Σ_w = I` and the configured precision. Stops
/// when the marginal log-likelihood of the data changes by less than the
/// tolerance, or after `max_iterations` (with a warning).
///
/// # Errors
/// `ModelFit` on a non-finite log-likelihood or a numerically singular
/// posterior.
pub fn expectation_maximization(
    prepared: &PreparedCondition,
    basis: &Basis,
    em: &EmConfig,
) -> Result<(DVector<f64>, DMatrix<f64>), ModelError> {
    let stats: Vec<TrialStats> = prepared
        .trials
        .iter()
        .map(|trial| {
            let h = basis.stacked_design(&trial.times, prepared.dimension);
            let y = trial.stacked();
            TrialStats {
                hth: h.transpose() * &h,
                hty: h.transpose() * &y,
                yty: y.dot(&y),
                observations: y.len(),
            }
        })
        .collect();

    let k = stats.len() as f64;
    let total_observations: usize = stats.iter().map(|s| s.observations).sum();
    let len = basis.count() * prepared.dimension;

    let mut mu_w = DVector::zeros(len);
    let mut sig_w = DMatrix::identity(len, len);
    let mut beta = em.initial_precision;
    let mut previous = f64::NEG_INFINITY;

    for iteration in 0..em.max_iterations {
        let sig_w_chol = sig_w
            .clone()
            .cholesky()
            .ok_or_else(|| ModelError::fit("EM weight covariance lost positive definiteness"))?;
        let sig_w_inv = sig_w_chol.inverse();
        let sig_w_log_det = cholesky_log_determinant(&sig_w_chol.l());
        let prior_term = &sig_w_inv * &mu_w;

        // E-step, evaluating the marginal log-likelihood under the current
        // parameters on the way
        let mut log_likelihood = 0.0;
        let mut means = Vec::with_capacity(stats.len());
        let mut covariances = Vec::with_capacity(stats.len());
        for s in &stats {
            let a = &sig_w_inv + &s.hth * beta;
            let a_chol = a
                .cholesky()
                .ok_or_else(|| ModelError::fit("EM posterior precision is singular"))?;
            let p = a_chol.inverse();

            // Woodbury: C = β⁻¹I + H Σ_w Hᵀ
            let n = s.observations as f64;
            let log_det_c = cholesky_log_determinant(&a_chol.l()) + sig_w_log_det - n * beta.ln();
            let htr = &s.hty - &s.hth * &mu_w;
            let rtr = s.yty - 2.0 * mu_w.dot(&s.hty) + mu_w.dot(&(&s.hth * &mu_w));
            let quad = beta * rtr - beta * beta * htr.dot(&(&p * &htr));
            log_likelihood += -0.5 * (n * (2.0 * PI).ln() + log_det_c + quad);

            means.push(&p * (&prior_term + &s.hty * beta));
            covariances.push(p);
        }

        if !log_likelihood.is_finite() {
            return Err(ModelError::fit(format!(
                "EM log-likelihood is not finite at iteration {}",
                iteration
            )));
        }

        log::trace!(
            "EM iteration {}: log-likelihood {:.6}, beta {:.4e}",
            iteration,
            log_likelihood,
            beta
        );

        if (log_likelihood - previous).abs() < em.tolerance {
            log::debug!("EM converged after {} iterations", iteration);
            return Ok((mu_w, sig_w));
        }
        previous = log_likelihood;

        // M-step
        let mut new_mu = DVector::zeros(len);
        for m in &means {
            new_mu += m;
        }
        new_mu /= k;

        let mut new_sig = DMatrix::zeros(len, len);
        for (m, p) in means.iter().zip(&covariances) {
            let diff = m - &new_mu;
            new_sig += p + &diff * diff.transpose();
        }
        new_sig /= k;

        let mut residual = 0.0;
        for ((s, m), p) in stats.iter().zip(&means).zip(&covariances) {
            residual += s.yty - 2.0 * m.dot(&s.hty) + m.dot(&(&s.hth * m));
            residual += (&s.hth * p).trace();
        }
        let noise = (residual / total_observations as f64).max(EM_MIN_NOISE_VARIANCE);

        mu_w = new_mu;
        sig_w = nearest_spd(&new_sig, EM_MIN_WEIGHT_VARIANCE);
        beta = 1.0 / noise;
    }

    log::warn!(
        "EM reached the iteration cap ({}) without converging",
        em.max_iterations
    );
    Ok((mu_w, sig_w))
}
