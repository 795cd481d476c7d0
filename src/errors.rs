//! Error types for model building and queries
//!
//! Every fallible operation returns [`ModelError`]. Errors are data or
//! configuration problems, so none of them are retried.

use std::fmt;

/// Errors raised while ingesting trials, fitting models or answering queries
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Dimension mismatch between expected and actual
    DimensionMismatch {
        /// What was expected
        expected: usize,
        /// What was received
        actual: usize,
        /// Context (e.g., "trial dimension", "sample count")
        context: String,
    },

    /// A condition could not be fitted (too few trials, degenerate
    /// covariance, numerical failure)
    ModelFit {
        /// Description of the failure
        description: String,
    },

    /// A query referenced something that does not exist or used an
    /// invalid parameter
    InvalidQuery {
        /// Description of the issue
        description: String,
    },

    /// A trial violates its own invariants (e.g., non-increasing time)
    InvalidTrial {
        /// Description of the issue
        description: String,
    },

    /// Configuration error
    Configuration {
        /// Description of the configuration issue
        description: String,
    },
}

impl ModelError {
    pub(crate) fn fit(description: impl Into<String>) -> Self {
        ModelError::ModelFit {
            description: description.into(),
        }
    }

    pub(crate) fn query(description: impl Into<String>) -> Self {
        ModelError::InvalidQuery {
            description: description.into(),
        }
    }

    pub(crate) fn config(description: impl Into<String>) -> Self {
        ModelError::Configuration {
            description: description.into(),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::DimensionMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    context, expected, actual
                )
            }
            ModelError::ModelFit { description } => {
                write!(f, "Model fit failed: {}", description)
            }
            ModelError::InvalidQuery { description } => {
                write!(f, "Invalid query: {}", description)
            }
            ModelError::InvalidTrial { description } => {
                write!(f, "Invalid trial: {}", description)
            }
            ModelError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = ModelError::DimensionMismatch {
            expected: 2,
            actual: 3,
            context: "trial dimension".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("trial dimension"));
        assert!(msg.contains('2'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            ModelError::fit("too few trials"),
            ModelError::ModelFit { .. }
        ));
        assert!(matches!(
            ModelError::query("index 4 out of range"),
            ModelError::InvalidQuery { .. }
        ));
        assert!(ModelError::config("resolution must be >= 2")
            .to_string()
            .starts_with("Configuration error"));
    }
}
