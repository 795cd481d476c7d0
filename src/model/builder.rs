//! Condition model builder
//!
//! Turns one [`Condition`] into a [`FittedModel`]: prepare the trials,
//! dispatch on the configured strategy, then map the moments back to the
//! original units and derive the cells.

use crate::errors::ModelError;
use crate::trajectory::Condition;

use super::basis::Basis;
use super::config::{ModelConfig, ModelType};
use super::fitted::FittedModel;
use super::{parametric, resampling};

/// Fit one condition.
///
/// # Errors
/// * `Configuration` for invalid settings
/// * `DimensionMismatch` if the condition's dimensionality is not `dimension`
/// * `ModelFit` for too few usable trials, a degenerate covariance or a
///   numerical failure during estimation
pub fn build(
    condition: &Condition,
    dimension: usize,
    config: &ModelConfig,
) -> Result<FittedModel, ModelError> {
    config.validate()?;

    let prepared = condition.prepare(
        dimension,
        config.skip_invalid_trials,
        config.time_normalization,
    )?;

    log::debug!(
        "Fitting condition '{}' ({}): {} trials, {} samples, {} skipped",
        condition.label(),
        config.model_type,
        prepared.trials.len(),
        prepared.total_samples(),
        prepared.skipped.len()
    );

    let (mu, sig) = match config.model_type {
        ModelType::Resampling => resampling::fit(&prepared, config.component_count),
        ModelType::Parametric => parametric::fit(
            &prepared,
            config.component_count,
            &Basis::new(config.basis),
            config.estimator,
            &config.em,
        )?,
    };

    FittedModel::from_normalized(condition.label(), config.model_type, &prepared, mu, sig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{BasisConfig, BasisKind, Estimator};
    use crate::trajectory::Trial;

    fn line(offset: f64, slope: f64) -> Trial {
        let times: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let rows: Vec<Vec<f64>> = times
            .iter()
            .map(|&t| vec![t, offset + slope * t + 0.01 * (1.3 * t + offset).sin()])
            .collect();
        Trial::from_rows(times, &rows).unwrap()
    }

    fn fan() -> Condition {
        Condition::new(
            "fan",
            vec![line(0.0, 0.1), line(1.0, 0.0), line(2.0, -0.1), line(0.5, 0.05)],
        )
        .unwrap()
    }

    #[test]
    fn test_resampling_build() {
        let model = build(&fan(), 2, &ModelConfig::resampling(10)).unwrap();
        assert_eq!(model.component_count(), 10);
        assert_eq!(model.dimension(), 2);
        assert_eq!(model.trial_count(), 4);

        let mean = model.mean_points();
        assert!((mean[(0, 0)] - 0.0).abs() < 1e-9);
        assert!((mean[(9, 0)] - 9.0).abs() < 1e-9);
        // Mean offset at t = 0
        assert!((mean[(0, 1)] - 0.875).abs() < 0.01);
    }

    #[test]
    fn test_parametric_builds() {
        let basis = BasisConfig::new(BasisKind::Bernstein, 3);
        for estimator in [Estimator::MaximumLikelihood, Estimator::ExpectationMaximization] {
            let config = ModelConfig::parametric(8, basis).with_estimator(estimator);
            let model = build(&fan(), 2, &config).unwrap();
            assert_eq!(model.component_count(), 8);
            let mean = model.mean_points();
            assert!((mean[(7, 0)] - 9.0).abs() < 0.1, "{:?}: {}", estimator, mean[(7, 0)]);
        }
    }

    #[test]
    fn test_identical_trials_are_degenerate() {
        let c = Condition::new("same", vec![line(0.0, 1.0), line(0.0, 1.0)]).unwrap();
        let err = build(&c, 2, &ModelConfig::resampling(5)).unwrap_err();
        assert!(matches!(err, ModelError::ModelFit { .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = build(&fan(), 2, &ModelConfig::resampling(0)).unwrap_err();
        assert!(matches!(err, ModelError::Configuration { .. }));
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = ModelConfig::parametric(6, BasisConfig::default());
        let a = build(&fan(), 2, &config).unwrap();
        let b = build(&fan(), 2, &config).unwrap();
        assert_eq!(a.mean_vector(), b.mean_vector());
        assert_eq!(a.covariance(), b.covariance());
    }
}
