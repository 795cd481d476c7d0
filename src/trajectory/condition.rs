//! Conditions: labelled groups of trials
//!
//! [`Condition::prepare`] is the resampler entry point used by the model
//! builder: it masks every trial, applies the invalid-trial policy and maps
//! the surviving trials onto the unit time / unit box parametrisation.

use serde::{Deserialize, Serialize};

use crate::common::constants::{MIN_TRIALS, MIN_VALID_SAMPLES};
use crate::errors::ModelError;

use super::outline::Outline;
use super::trial::{infer_dimension, validate_dimension, ResampledTrial, Trial};

/// How raw time stamps are mapped onto the shared [0, 1] parametrisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeNormalization {
    /// One min/max over all trials of the condition
    #[default]
    Condition,
    /// Every trial stretched onto [0, 1] independently
    Trial,
}

/// A labelled group of trials sharing one dimensionality
#[derive(Debug, Clone)]
pub struct Condition {
    label: String,
    trials: Vec<Trial>,
}

impl Condition {
    /// Create a condition, checking that every trial has the dimensionality
    /// of the first one.
    pub fn new(label: impl Into<String>, trials: Vec<Trial>) -> Result<Self, ModelError> {
        let label = label.into();
        if let Some(first) = trials.first() {
            let d = infer_dimension(first);
            if let Some((i, bad)) = trials
                .iter()
                .enumerate()
                .find(|(_, t)| !validate_dimension(t, d))
            {
                return Err(ModelError::DimensionMismatch {
                    expected: d,
                    actual: bad.dimension(),
                    context: format!("trial {} of condition '{}'", i, label),
                });
            }
        }
        Ok(Self { label, trials })
    }

    /// Condition label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Trials in insertion order
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Dimensionality shared by the trials, `None` for an empty condition
    pub fn dimension(&self) -> Option<usize> {
        self.trials.first().map(infer_dimension)
    }

    /// Number of trials (before masking)
    #[inline]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Whether the condition holds no trials
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Mask, filter and normalise the trials for fitting.
    ///
    /// Trials with fewer than two finite samples are rejected, or skipped
    /// with a warning when `skip_invalid_trials` is set. At least two usable
    /// trials must remain.
    pub fn prepare(
        &self,
        dimension: usize,
        skip_invalid_trials: bool,
        time_normalization: TimeNormalization,
    ) -> Result<PreparedCondition, ModelError> {
        if let Some(d) = self.dimension() {
            if d != dimension {
                return Err(ModelError::DimensionMismatch {
                    expected: dimension,
                    actual: d,
                    context: format!("condition '{}'", self.label),
                });
            }
        }

        let mut valid = Vec::with_capacity(self.trials.len());
        let mut skipped = Vec::new();
        for (i, trial) in self.trials.iter().enumerate() {
            let masked = trial.valid_samples();
            if masked.len() >= MIN_VALID_SAMPLES {
                valid.push(masked);
                continue;
            }
            if !skip_invalid_trials {
                return Err(ModelError::fit(format!(
                    "trial {} of condition '{}' has {} valid samples, at least {} required",
                    i,
                    self.label,
                    masked.len(),
                    MIN_VALID_SAMPLES
                )));
            }
            log::warn!(
                "Skipping trial {} of condition '{}': {} valid samples",
                i,
                self.label,
                masked.len()
            );
            skipped.push(i);
        }

        if valid.len() < MIN_TRIALS {
            return Err(ModelError::fit(format!(
                "condition '{}' has {} valid trials, at least {} required",
                self.label,
                valid.len(),
                MIN_TRIALS
            )));
        }

        let outline = Outline::from_trials(dimension, &valid);
        let time_range = time_range(&valid);

        let trials = valid
            .into_iter()
            .map(|t| normalize_trial(t, &outline, time_range, time_normalization))
            .collect();

        Ok(PreparedCondition {
            dimension,
            trials,
            outline,
            time_range,
            skipped,
        })
    }
}

/// Trials of one condition on the unit parametrisation, ready for fitting
#[derive(Debug, Clone)]
pub struct PreparedCondition {
    /// Spatial dimension D
    pub dimension: usize,
    /// Normalised trials: time in [0, 1], each axis scaled by the outline
    pub trials: Vec<ResampledTrial>,
    /// Spatial bounds of the raw (masked) samples
    pub outline: Outline,
    /// `(min, max)` of the raw time stamps
    pub time_range: (f64, f64),
    /// Indices of trials dropped by the invalid-trial policy
    pub skipped: Vec<usize>,
}

impl PreparedCondition {
    /// Total number of samples over all trials
    pub fn total_samples(&self) -> usize {
        self.trials.iter().map(|t| t.len()).sum()
    }
}

fn time_range(trials: &[ResampledTrial]) -> (f64, f64) {
    trials.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
        (lo.min(t.times[0]), hi.max(t.times[t.len() - 1]))
    })
}

fn unit_scale(t: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (t - lo) / (hi - lo)
    } else {
        0.0
    }
}

fn normalize_trial(
    trial: ResampledTrial,
    outline: &Outline,
    condition_range: (f64, f64),
    mode: TimeNormalization,
) -> ResampledTrial {
    let (lo, hi) = match mode {
        TimeNormalization::Condition => condition_range,
        TimeNormalization::Trial => (trial.times[0], trial.times[trial.len() - 1]),
    };
    let times = trial.times.iter().map(|&t| unit_scale(t, lo, hi)).collect();

    let mut positions = trial.positions;
    for (d, mut column) in positions.column_iter_mut().enumerate() {
        let offset = outline.lower[d];
        let scale = outline.scale(d);
        column.apply(|v| *v = (*v - offset) / scale);
    }

    ResampledTrial { times, positions }
}
