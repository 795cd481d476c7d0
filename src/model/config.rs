//! Model configuration
//!
//! [`ModelConfig`] selects how each condition is fitted. It is plain data
//! with builder-style setters and JSON (de)serialisation so hosts can keep
//! settings next to their trial data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::constants::{
    DEFAULT_BASIS_COUNT, DEFAULT_COMPONENT_COUNT, DEFAULT_EM_INITIAL_PRECISION,
    DEFAULT_EM_MAX_ITERATIONS, DEFAULT_EM_TOLERANCE, DEFAULT_SEED,
};
use crate::errors::ModelError;
use crate::trajectory::TimeNormalization;

/// Fitting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Interpolate every trial onto the cell grid and take sample moments.
    /// Quick; only suitable for clean, complete data.
    #[default]
    Resampling,
    /// Fit a smooth basis-function representation per trial, then project
    /// the weight distribution onto the cell grid.
    Parametric,
}

impl FromStr for ModelType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resampling" => Ok(ModelType::Resampling),
            "parametric" => Ok(ModelType::Parametric),
            other => Err(ModelError::config(format!("unknown model type '{}'", other))),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Resampling => write!(f, "resampling"),
            ModelType::Parametric => write!(f, "parametric"),
        }
    }
}

/// Family of basis functions on the unit time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisKind {
    /// Radial Gaussian bumps with evenly spaced centres
    #[default]
    Gaussian,
    /// Bernstein polynomials of degree `count - 1`
    Bernstein,
}

/// Basis used by [`ModelType::Parametric`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisConfig {
    /// Basis family
    pub kind: BasisKind,
    /// Number of basis functions per dimension (at least 2)
    pub count: usize,
}

impl BasisConfig {
    /// Create a basis configuration
    pub fn new(kind: BasisKind, count: usize) -> Self {
        Self { kind, count }
    }
}

impl Default for BasisConfig {
    fn default() -> Self {
        Self::new(BasisKind::Gaussian, DEFAULT_BASIS_COUNT)
    }
}

/// Weight estimator used by [`ModelType::Parametric`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Least-squares weights per trial; noise does not enter the estimate
    MaximumLikelihood,
    /// Expectation maximisation with a shared weight prior and learned
    /// observation noise
    #[default]
    ExpectationMaximization,
}

/// EM iteration settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Stop when the marginal log-likelihood changes less than this
    pub tolerance: f64,
    /// Initial noise precision
    pub initial_precision: f64,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_EM_MAX_ITERATIONS,
            tolerance: DEFAULT_EM_TOLERANCE,
            initial_precision: DEFAULT_EM_INITIAL_PRECISION,
        }
    }
}

/// Complete model-building configuration
///
/// # Example
///
/// ```
/// use teetool::{BasisConfig, BasisKind, ModelConfig, ModelType};
///
/// let config = ModelConfig::parametric(50, BasisConfig::new(BasisKind::Bernstein, 6))
///     .with_seed(7);
/// assert_eq!(config.model_type, ModelType::Parametric);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fitting strategy
    pub model_type: ModelType,
    /// Number of Gaussian cells along the trajectory (M)
    pub component_count: usize,
    /// Basis for parametric fits
    pub basis: BasisConfig,
    /// Weight estimator for parametric fits
    pub estimator: Estimator,
    /// EM settings
    pub em: EmConfig,
    /// Time parametrisation
    pub time_normalization: TimeNormalization,
    /// Skip trials without enough finite samples instead of failing
    pub skip_invalid_trials: bool,
    /// Seed for stochastic operations
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_type: ModelType::Resampling,
            component_count: DEFAULT_COMPONENT_COUNT,
            basis: BasisConfig::default(),
            estimator: Estimator::default(),
            em: EmConfig::default(),
            time_normalization: TimeNormalization::default(),
            skip_invalid_trials: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl ModelConfig {
    /// Resampling model with `component_count` cells
    pub fn resampling(component_count: usize) -> Self {
        Self {
            component_count,
            ..Self::default()
        }
    }

    /// Parametric model with `component_count` cells
    pub fn parametric(component_count: usize, basis: BasisConfig) -> Self {
        Self {
            model_type: ModelType::Parametric,
            component_count,
            basis,
            ..Self::default()
        }
    }

    /// Set the parametric weight estimator
    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Set EM iteration settings
    pub fn with_em(mut self, em: EmConfig) -> Self {
        self.em = em;
        self
    }

    /// Set the time parametrisation
    pub fn with_time_normalization(mut self, mode: TimeNormalization) -> Self {
        self.time_normalization = mode;
        self
    }

    /// Skip (with a warning) trials that have fewer than two finite samples
    pub fn with_skip_invalid_trials(mut self, skip: bool) -> Self {
        self.skip_invalid_trials = skip;
        self
    }

    /// Set the seed for stochastic operations
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.component_count == 0 {
            return Err(ModelError::config("component_count must be positive"));
        }
        if self.model_type == ModelType::Parametric {
            if self.basis.count < 2 {
                return Err(ModelError::config(format!(
                    "basis count must be at least 2, got {}",
                    self.basis.count
                )));
            }
            if self.estimator == Estimator::ExpectationMaximization {
                let em = &self.em;
                if em.max_iterations == 0 {
                    return Err(ModelError::config("EM max_iterations must be positive"));
                }
                if !(em.tolerance > 0.0) || !(em.initial_precision > 0.0) {
                    return Err(ModelError::config(
                        "EM tolerance and initial precision must be positive",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ModelError::config(format!("invalid model config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
