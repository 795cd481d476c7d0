/*!
# Teetool - statistical models of trajectory ensembles

Rust implementation of a trajectory-modelling toolbox: repeated observations
of the same movement (trials) are grouped into labelled conditions, each
condition is fitted with a continuous-time Gaussian model, and the models are
queried for mean trajectories, log-likelihood fields and confidence tubes.

## Features

- 2D and 3D trials with irregular sampling and missing values
- Resampling and parametric (basis function, ML or EM) models
- Log-likelihood fields on a regular grid
- Confidence tubes at any width in standard deviations, with the boundary
  traced into polylines
- Parallel per-condition evaluation (`rayon` feature, on by default)

## Modules

- [`trajectory`] - Trials, conditions and the resampling step
- [`model`] - Model configuration, fitting and fitted models
- [`query`] - Grids, density fields, tubes and mean trajectories
- [`world`] - The build/query lifecycle
- [`reporter`] - Progress notifications
- [`common`] - Low-level utilities

## Example

```rust
use teetool::{ModelConfig, Trial, World};

let bundle = |offset: f64| -> Vec<Trial> {
    (0..4)
        .map(|k| {
            let times: Vec<f64> = (0..20).map(|i| i as f64).collect();
            let rows: Vec<Vec<f64>> = times
                .iter()
                .map(|&t| vec![t, offset + 0.3 * k as f64 + 0.01 * t])
                .collect();
            Trial::from_rows(times, &rows).unwrap()
        })
        .collect()
};

let mut world = World::new(2, 30).unwrap();
world.add_condition(bundle(0.0), "left").unwrap();
world.add_condition(bundle(5.0), "right").unwrap();

let built = world.build_model(&ModelConfig::resampling(25)).unwrap();
let tubes = built.get_tube(&[0, 1], 1.0).unwrap();
assert_eq!(tubes.len(), 2);
```
*/

/// Error types
pub mod errors;

/// Low-level utilities (linear algebra, constants)
pub mod common;

/// Trials, conditions and resampling
pub mod trajectory;

/// Model configuration and fitting
pub mod model;

/// Queries against fitted models
pub mod query;

/// Progress reporting
pub mod reporter;

/// Build/query lifecycle
pub mod world;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Errors
pub use errors::ModelError;

// Input types
pub use trajectory::{Condition, Outline, TimeNormalization, Trial};

// Configuration
pub use model::{BasisConfig, BasisKind, EmConfig, Estimator, ModelConfig, ModelType};
pub use world::{WorldConfig, WorldSnapshot};

// Models and results
pub use model::{FittedModel, GaussianCell};
pub use query::{DensityResult, Grid, MeanResult, Polyline, TubeResult};

// Lifecycle
pub use world::{BuiltWorld, World};

// Reporters
pub use reporter::{
    CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter, ProgressReporter, Stage,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
