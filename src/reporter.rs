//! Progress reporting for world builds and queries.
//!
//! A [`ProgressReporter`] is notified after each condition finishes a stage.
//! Reporting is advisory: callbacks cannot cancel or alter the computation.
//!
//! # Example
//!
//! ```
//! use teetool::{DebugReporter, ProgressReporter, Stage};
//!
//! let mut reporter = DebugReporter::new();
//! reporter.on_progress(Stage::Build, 1, 2);
//! reporter.on_progress(Stage::Build, 2, 2);
//!
//! assert_eq!(reporter.events().len(), 2);
//! assert!(reporter.is_complete(Stage::Build));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of the world lifecycle being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fitting condition models
    Build,
    /// Extracting mean trajectories
    Mean,
    /// Evaluating log-likelihood fields
    LogLikelihood,
    /// Extracting tubes
    Tube,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Mean => write!(f, "mean"),
            Stage::LogLikelihood => write!(f, "log-likelihood"),
            Stage::Tube => write!(f, "tube"),
        }
    }
}

/// Observer for per-condition progress.
///
/// All methods have default empty implementations, so you only need to
/// override the events you care about.
///
/// # Thread Safety
///
/// Callbacks take `&mut self`. Parallel runs serialise them behind a mutex,
/// so `completed` is monotone but conditions may finish in any order.
pub trait ProgressReporter {
    /// Called after a condition finishes `stage`; `completed` of `total`
    /// conditions are done.
    fn on_progress(&mut self, _stage: Stage, _completed: usize, _total: usize) {}

    /// Called once a condition model is fitted.
    fn on_condition_built(&mut self, _index: usize, _label: &str, _trials: usize) {}
}

/// Reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NoOpReporter {}

/// One captured progress event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage reported
    pub stage: Stage,
    /// Conditions completed so far
    pub completed: usize,
    /// Conditions in the run
    pub total: usize,
}

/// Reporter that captures every event for inspection.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    events: Vec<ProgressEvent>,
    built: Vec<(usize, String, usize)>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        self.events.clear();
        self.built.clear();
    }

    /// Captured progress events in arrival order.
    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    /// Captured `(index, label, trials)` of built conditions.
    pub fn built_conditions(&self) -> &[(usize, String, usize)] {
        &self.built
    }

    /// Whether `stage` reported all of its conditions at least once.
    pub fn is_complete(&self, stage: Stage) -> bool {
        self.events
            .iter()
            .any(|e| e.stage == stage && e.completed == e.total)
    }
}

impl ProgressReporter for DebugReporter {
    fn on_progress(&mut self, stage: Stage, completed: usize, total: usize) {
        self.events.push(ProgressEvent {
            stage,
            completed,
            total,
        });
    }

    fn on_condition_built(&mut self, index: usize, label: &str, trials: usize) {
        self.built.push((index, label.to_string(), trials));
    }
}

/// Reporter that forwards events to the `log` facade.
///
/// Completion of a stage is logged at INFO, intermediate progress and
/// built conditions at DEBUG.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for LoggingReporter {
    fn on_progress(&mut self, stage: Stage, completed: usize, total: usize) {
        if completed == total {
            log::info!("{} complete: {} conditions", stage, total);
        } else {
            log::debug!("{}: {}/{} conditions", stage, completed, total);
        }
    }

    fn on_condition_built(&mut self, index: usize, label: &str, trials: usize) {
        log::debug!("Built condition {} ('{}') from {} trials", index, label, trials);
    }
}

/// Reporter that forwards events to two child reporters.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: ProgressReporter, B: ProgressReporter> {
    first: A,
    second: B,
}

impl<A: ProgressReporter, B: ProgressReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Get a reference to the first reporter.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a reference to the second reporter.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: ProgressReporter, B: ProgressReporter> ProgressReporter for CompositeReporter<A, B> {
    fn on_progress(&mut self, stage: Stage, completed: usize, total: usize) {
        self.first.on_progress(stage, completed, total);
        self.second.on_progress(stage, completed, total);
    }

    fn on_condition_built(&mut self, index: usize, label: &str, trials: usize) {
        self.first.on_condition_built(index, label, trials);
        self.second.on_condition_built(index, label, trials);
    }
}
