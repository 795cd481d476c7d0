//! Numerical constants and configuration defaults

/// Default number of Gaussian cells along a modelled trajectory
pub const DEFAULT_COMPONENT_COUNT: usize = 100;

/// Default number of basis functions per dimension for parametric models
pub const DEFAULT_BASIS_COUNT: usize = 5;

/// Default cap on EM iterations
pub const DEFAULT_EM_MAX_ITERATIONS: usize = 2001;

/// Default EM convergence tolerance on the absolute change in
/// marginal log-likelihood
pub const DEFAULT_EM_TOLERANCE: f64 = 1e-3;

/// Initial noise precision (beta) of the EM iteration
pub const DEFAULT_EM_INITIAL_PRECISION: f64 = 1000.0;

/// Default grid padding as a fraction of the training-data span per axis
pub const DEFAULT_GRID_PADDING: f64 = 0.1;

/// Default seed for stochastic operations (trajectory sampling)
pub const DEFAULT_SEED: u64 = 10;

/// Minimum number of finite samples a trial needs to be usable
pub const MIN_VALID_SAMPLES: usize = 2;

/// Minimum number of usable trials per condition (variance estimate)
pub const MIN_TRIALS: usize = 2;

/// Tolerance for SVD pseudo-inverse computation
///
/// Singular values below this threshold are treated as zero.
pub const SVD_TOLERANCE: f64 = 1e-10;

/// Relative eigenvalue floor used when repairing cell covariances
pub const SPD_RELATIVE_FLOOR: f64 = 1e-8;

/// Absolute eigenvalue floor, in squared units of the largest data span
pub const SPD_ABSOLUTE_FLOOR: f64 = 1e-12;

/// Total normalised variance below which a fit is considered degenerate
pub const DEGENERATE_VARIANCE: f64 = 1e-14;

/// Smallest weight-prior variance kept during EM (normalised units)
pub const EM_MIN_WEIGHT_VARIANCE: f64 = 1e-10;

/// Smallest observation-noise variance kept during EM (normalised units)
pub const EM_MIN_NOISE_VARIANCE: f64 = 1e-6;
