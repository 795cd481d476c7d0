//! World: the external interface
//!
//! A [`World`] accumulates labelled conditions of one dimensionality.
//! [`World::build_model`] consumes it, fits every condition and returns a
//! [`BuiltWorld`] that answers the queries. Adding conditions after the build
//! or querying before it is not expressible.
//!
//! All conditions of a built world share one evaluation [`Grid`] spanning the
//! union of their training data, so fields of different conditions can be
//! compared node by node.
//!
//! # Example
//!
//! ```
//! use teetool::{ModelConfig, Trial, World};
//!
//! let line = |offset: f64| {
//!     let times: Vec<f64> = (0..10).map(|i| i as f64).collect();
//!     let rows: Vec<Vec<f64>> = times.iter().map(|&t| vec![t, offset + 0.1 * t]).collect();
//!     Trial::from_rows(times, &rows).unwrap()
//! };
//!
//! let mut world = World::new(2, 20).unwrap();
//! world.add_condition(vec![line(0.0), line(1.0), line(0.5)], "a").unwrap();
//!
//! let built = world.build_model(&ModelConfig::resampling(15)).unwrap();
//! let mean = &built.get_mean(&[0]).unwrap()[0];
//! assert_eq!(mean.points.shape(), (15, 2));
//! ```

use std::sync::Mutex;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::common::constants::DEFAULT_GRID_PADDING;
use crate::errors::ModelError;
use crate::model::{build, FittedModel, ModelConfig};
use crate::query::{
    evaluate, extract_mean, extract_tube, DensityResult, Grid, MeanResult, TubeResult,
};
use crate::reporter::{NoOpReporter, ProgressReporter, Stage};
use crate::trajectory::{Condition, Outline, Trial};

/// World-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Spatial dimension (2 or 3)
    pub dimension: usize,
    /// Grid nodes per axis
    pub resolution: SmallVec<[usize; 3]>,
    /// Grid padding as a fraction of the data span per axis
    pub padding: f64,
}

impl WorldConfig {
    /// Same resolution on every axis
    pub fn new(dimension: usize, resolution: usize) -> Self {
        Self {
            dimension,
            resolution: std::iter::repeat(resolution).take(dimension).collect(),
            padding: DEFAULT_GRID_PADDING,
        }
    }

    /// One resolution per axis
    pub fn with_resolution(dimension: usize, resolution: &[usize]) -> Self {
        Self {
            dimension,
            resolution: SmallVec::from_slice(resolution),
            padding: DEFAULT_GRID_PADDING,
        }
    }

    /// Set the grid padding fraction
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(2..=3).contains(&self.dimension) {
            return Err(ModelError::config(format!(
                "world dimension must be 2 or 3, got {}",
                self.dimension
            )));
        }
        if self.resolution.len() != self.dimension {
            return Err(ModelError::config(format!(
                "expected {} resolution entries, got {}",
                self.dimension,
                self.resolution.len()
            )));
        }
        if let Some(&n) = self.resolution.iter().find(|&&n| n < 2) {
            return Err(ModelError::config(format!(
                "grid resolution must be at least 2 per axis, got {}",
                n
            )));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(ModelError::config(format!(
                "grid padding must be finite and non-negative, got {}",
                self.padding
            )));
        }
        Ok(())
    }
}

/// A world still accepting conditions
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    conditions: Vec<Condition>,
}

impl World {
    /// World of `dimension` with `resolution` grid nodes on every axis.
    ///
    /// # Errors
    /// `Configuration` if the dimension is not 2 or 3 or the resolution is
    /// below 2.
    pub fn new(dimension: usize, resolution: usize) -> Result<Self, ModelError> {
        Self::with_config(WorldConfig::new(dimension, resolution))
    }

    /// World with one grid resolution per axis.
    pub fn with_resolution(dimension: usize, resolution: &[usize]) -> Result<Self, ModelError> {
        Self::with_config(WorldConfig::with_resolution(dimension, resolution))
    }

    /// World from a complete configuration.
    pub fn with_config(config: WorldConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            config,
            conditions: Vec::new(),
        })
    }

    /// World settings
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Spatial dimension
    #[inline]
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Number of conditions added so far
    #[inline]
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Add a labelled condition; returns its query index.
    ///
    /// # Errors
    /// `DimensionMismatch` if a trial's dimensionality differs from the
    /// world's.
    pub fn add_condition(
        &mut self,
        trials: Vec<Trial>,
        label: impl Into<String>,
    ) -> Result<usize, ModelError> {
        let label = label.into();
        if let Some((i, trial)) = trials
            .iter()
            .enumerate()
            .find(|(_, t)| t.dimension() != self.config.dimension)
        {
            return Err(ModelError::DimensionMismatch {
                expected: self.config.dimension,
                actual: trial.dimension(),
                context: format!("trial {} of condition '{}'", i, label),
            });
        }

        let condition = Condition::new(label, trials)?;
        self.conditions.push(condition);
        Ok(self.conditions.len() - 1)
    }

    /// Fit every condition.
    ///
    /// # Errors
    /// The first error in condition order; `ModelFit` for a world without
    /// conditions.
    pub fn build_model(self, config: &ModelConfig) -> Result<BuiltWorld, ModelError> {
        self.build_model_with_reporter(config, &mut NoOpReporter)
    }

    /// [`build_model`](Self::build_model) with progress notifications.
    pub fn build_model_with_reporter(
        self,
        config: &ModelConfig,
        reporter: &mut (dyn ProgressReporter + Send),
    ) -> Result<BuiltWorld, ModelError> {
        config.validate()?;
        if self.conditions.is_empty() {
            return Err(ModelError::fit("world has no conditions to build"));
        }

        let dimension = self.config.dimension;
        let conditions = &self.conditions;
        let models = for_each_condition(conditions.len(), Stage::Build, reporter, |i| {
            build(&conditions[i], dimension, config)
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        for (i, model) in models.iter().enumerate() {
            reporter.on_condition_built(i, model.label(), model.trial_count());
        }

        let outline = models
            .iter()
            .map(|m| m.training_outline().clone())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Outline::empty(dimension));
        let grid = Grid::new(&outline, &self.config.resolution, self.config.padding)?;

        log::info!(
            "Built {} conditions ({} model, {} cells each)",
            models.len(),
            config.model_type,
            config.component_count
        );

        Ok(BuiltWorld {
            config: self.config,
            model_config: config.clone(),
            models,
            grid,
        })
    }
}

/// A world with fitted models, answering queries
#[derive(Debug, Clone)]
pub struct BuiltWorld {
    config: WorldConfig,
    model_config: ModelConfig,
    models: Vec<FittedModel>,
    grid: Grid,
}

impl BuiltWorld {
    /// Number of conditions
    #[inline]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the world holds no conditions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Condition labels in index order
    pub fn labels(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.label()).collect()
    }

    /// All fitted models in index order
    pub fn models(&self) -> &[FittedModel] {
        &self.models
    }

    /// Fitted model of one condition
    pub fn model(&self, index: usize) -> Result<&FittedModel, ModelError> {
        self.models.get(index).ok_or_else(|| {
            ModelError::query(format!(
                "condition index {} out of range ({} conditions)",
                index,
                self.models.len()
            ))
        })
    }

    /// Evaluation grid shared by the field queries
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Settings used for the build
    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    fn check_indices(&self, indices: &[usize]) -> Result<(), ModelError> {
        indices.iter().try_for_each(|&i| self.model(i).map(|_| ()))
    }

    /// Mean trajectories, in the order of `indices`.
    pub fn get_mean(&self, indices: &[usize]) -> Result<Vec<MeanResult>, ModelError> {
        self.get_mean_with_reporter(indices, &mut NoOpReporter)
    }

    /// [`get_mean`](Self::get_mean) with progress notifications.
    pub fn get_mean_with_reporter(
        &self,
        indices: &[usize],
        reporter: &mut (dyn ProgressReporter + Send),
    ) -> Result<Vec<MeanResult>, ModelError> {
        self.check_indices(indices)?;
        for_each_condition(indices.len(), Stage::Mean, reporter, |k| {
            Ok(extract_mean(&self.models[indices[k]]))
        })
        .into_iter()
        .collect()
    }

    /// Log-likelihood fields on the shared grid, in the order of `indices`.
    pub fn get_log_likelihood(&self, indices: &[usize]) -> Result<Vec<DensityResult>, ModelError> {
        self.get_log_likelihood_with_reporter(indices, &mut NoOpReporter)
    }

    /// [`get_log_likelihood`](Self::get_log_likelihood) with progress
    /// notifications.
    pub fn get_log_likelihood_with_reporter(
        &self,
        indices: &[usize],
        reporter: &mut (dyn ProgressReporter + Send),
    ) -> Result<Vec<DensityResult>, ModelError> {
        self.check_indices(indices)?;
        for_each_condition(indices.len(), Stage::LogLikelihood, reporter, |k| {
            evaluate(&self.models[indices[k]], &self.grid)
        })
        .into_iter()
        .collect()
    }

    /// Tubes at `sd_width` standard deviations, in the order of `indices`.
    ///
    /// Membership is monotone in `sd_width`: every node inside a tube stays
    /// inside at any larger width. A very large width therefore marks the
    /// whole grid inside and traces no boundary, while a vanishing width
    /// leaves the field all false.
    ///
    /// # Errors
    /// `InvalidQuery` for an unknown index or an `sd_width` that is not
    /// finite and positive.
    pub fn get_tube(&self, indices: &[usize], sd_width: f64) -> Result<Vec<TubeResult>, ModelError> {
        self.get_tube_with_reporter(indices, sd_width, &mut NoOpReporter)
    }

    /// [`get_tube`](Self::get_tube) with progress notifications.
    pub fn get_tube_with_reporter(
        &self,
        indices: &[usize],
        sd_width: f64,
        reporter: &mut (dyn ProgressReporter + Send),
    ) -> Result<Vec<TubeResult>, ModelError> {
        self.check_indices(indices)?;
        if !(sd_width.is_finite() && sd_width > 0.0) {
            return Err(ModelError::query(format!(
                "sd_width must be finite and positive, got {}",
                sd_width
            )));
        }
        for_each_condition(indices.len(), Stage::Tube, reporter, |k| {
            extract_tube(&self.models[indices[k]], sd_width, &self.grid)
        })
        .into_iter()
        .collect()
    }

    /// Bounding box of the tubes of `indices` at `sd_width`.
    pub fn outline(&self, indices: &[usize], sd_width: f64) -> Result<Outline, ModelError> {
        self.check_indices(indices)?;
        let mut outline = Outline::empty(self.config.dimension);
        for &i in indices {
            outline = outline.union(&self.models[i].confidence_outline(sd_width)?);
        }
        Ok(outline)
    }

    /// Draw `n` trajectories from condition `index` using the build seed.
    pub fn sample(&self, index: usize, n: usize) -> Result<Vec<DMatrix<f64>>, ModelError> {
        Ok(self.model(index)?.sample(n, self.model_config.seed))
    }

    /// Serialisable summary of the settings and fitted conditions
    pub fn config_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            world: self.config.clone(),
            model: self.model_config.clone(),
            grid_shape: self.grid.shape(),
            conditions: self
                .models
                .iter()
                .map(|m| ConditionSummary {
                    label: m.label().to_string(),
                    trials: m.trial_count(),
                    components: m.component_count(),
                    time_range: m.time_range(),
                    outline: m.training_outline().clone(),
                })
                .collect(),
        }
    }
}

/// Summary of one fitted condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    /// Condition label
    pub label: String,
    /// Trials used in the fit
    pub trials: usize,
    /// Number of cells
    pub components: usize,
    /// Raw time range of the training data
    pub time_range: (f64, f64),
    /// Spatial bounds of the training data
    pub outline: Outline,
}

/// Snapshot of a built world for debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World settings
    pub world: WorldConfig,
    /// Model settings
    pub model: ModelConfig,
    /// Nodes per axis of the shared grid
    pub grid_shape: Vec<usize>,
    /// Fitted conditions in index order
    pub conditions: Vec<ConditionSummary>,
}

impl WorldSnapshot {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Run `f` for each of `count` conditions and report progress.
///
/// Results keep index order regardless of completion order.
fn for_each_condition<T, F>(
    count: usize,
    stage: Stage,
    reporter: &mut (dyn ProgressReporter + Send),
    f: F,
) -> Vec<Result<T, ModelError>>
where
    T: Send,
    F: Fn(usize) -> Result<T, ModelError> + Sync + Send,
{
    let progress = Mutex::new((0usize, reporter));
    let run = |i: usize| {
        let result = f(i);
        if let Ok(mut guard) = progress.lock() {
            guard.0 += 1;
            let completed = guard.0;
            guard.1.on_progress(stage, completed, count);
        }
        result
    };

    #[cfg(feature = "rayon")]
    let results = (0..count).into_par_iter().map(run).collect();

    #[cfg(not(feature = "rayon"))]
    let results = (0..count).map(run).collect();

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::DebugReporter;

    fn line(offset: f64) -> Trial {
        let times: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let rows: Vec<Vec<f64>> = times
            .iter()
            .map(|&t| vec![t, offset + 0.1 * t + 0.02 * (t + offset).sin()])
            .collect();
        Trial::from_rows(times, &rows).unwrap()
    }

    #[test]
    fn test_world_config_validation() {
        assert!(World::new(4, 10).is_err());
        assert!(World::new(2, 1).is_err());
        assert!(World::with_resolution(2, &[10]).is_err());
        assert!(World::with_config(WorldConfig::new(2, 10).with_padding(-1.0)).is_err());
        assert!(World::with_resolution(3, &[10, 12, 5]).is_ok());
    }

    #[test]
    fn test_add_condition_checks_dimension() {
        let mut world = World::new(3, 10).unwrap();
        let err = world.add_condition(vec![line(0.0)], "flat").unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { expected: 3, actual: 2, .. }));
        assert_eq!(world.condition_count(), 0);
    }

    #[test]
    fn test_empty_world_fails_to_build() {
        let world = World::new(2, 10).unwrap();
        assert!(matches!(
            world.build_model(&ModelConfig::default()),
            Err(ModelError::ModelFit { .. })
        ));
    }

    #[test]
    fn test_first_error_in_index_order() {
        let mut world = World::new(2, 10).unwrap();
        world.add_condition(vec![line(0.0), line(1.0)], "ok").unwrap();
        world.add_condition(vec![line(0.0)], "one").unwrap();
        world.add_condition(vec![], "none").unwrap();

        match world.build_model(&ModelConfig::resampling(5)) {
            Err(ModelError::ModelFit { description }) => assert!(description.contains("'one'")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_queries_follow_requested_order() {
        let mut world = World::new(2, 12).unwrap();
        world.add_condition(vec![line(0.0), line(1.0)], "low").unwrap();
        world.add_condition(vec![line(5.0), line(6.0)], "high").unwrap();
        let built = world.build_model(&ModelConfig::resampling(6)).unwrap();

        let means = built.get_mean(&[1, 0, 1]).unwrap();
        let labels: Vec<&str> = means.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["high", "low", "high"]);
        assert!(built.get_mean(&[]).unwrap().is_empty());
        assert!(matches!(built.get_mean(&[2]), Err(ModelError::InvalidQuery { .. })));
        assert!(matches!(built.get_tube(&[0], 0.0), Err(ModelError::InvalidQuery { .. })));
    }

    #[test]
    fn test_shared_grid_axes() {
        let mut world = World::new(2, 12).unwrap();
        world.add_condition(vec![line(0.0), line(1.0)], "low").unwrap();
        world.add_condition(vec![line(5.0), line(6.0)], "high").unwrap();
        let built = world.build_model(&ModelConfig::resampling(6)).unwrap();

        let fields = built.get_log_likelihood(&[0, 1]).unwrap();
        assert_eq!(fields[0].axes, fields[1].axes);
        assert_eq!(fields[0].values.shape(), &[12, 12]);
    }

    #[test]
    fn test_reporter_sees_every_condition() {
        let mut world = World::new(2, 8).unwrap();
        world.add_condition(vec![line(0.0), line(1.0)], "a").unwrap();
        world.add_condition(vec![line(3.0), line(4.0)], "b").unwrap();

        let mut reporter = DebugReporter::new();
        let built = world
            .build_model_with_reporter(&ModelConfig::resampling(4), &mut reporter)
            .unwrap();
        assert!(reporter.is_complete(Stage::Build));
        assert_eq!(reporter.built_conditions().len(), 2);
        assert_eq!(reporter.built_conditions()[1].1, "b");

        reporter.clear();
        built.get_tube_with_reporter(&[0, 1], 1.0, &mut reporter).unwrap();
        let completed: Vec<usize> = reporter.events().iter().map(|e| e.completed).collect();
        assert_eq!(completed, vec![1, 2]);
    }

    #[test]
    fn test_snapshot_json() {
        let mut world = World::new(2, 8).unwrap();
        world.add_condition(vec![line(0.0), line(1.0)], "a").unwrap();
        let built = world.build_model(&ModelConfig::resampling(4)).unwrap();

        let snapshot = built.config_snapshot();
        assert_eq!(snapshot.conditions[0].trials, 2);
        assert_eq!(snapshot.grid_shape, vec![8, 8]);

        let back: WorldSnapshot = serde_json::from_str(&snapshot.to_json()).unwrap();
        assert_eq!(back, snapshot);
    }
}
