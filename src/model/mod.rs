//! Per-condition trajectory models.
//!
//! - [`ModelConfig`] - fitting strategy and numerical settings
//! - [`build`] - fit one condition into a [`FittedModel`]
//! - [`FittedModel`] / [`GaussianCell`] - the immutable fitted artifact

pub mod basis;
pub mod builder;
pub mod config;
pub mod fitted;
pub mod parametric;
pub mod resampling;

pub use basis::Basis;
pub use builder::build;
pub use config::{BasisConfig, BasisKind, EmConfig, Estimator, ModelConfig, ModelType};
pub use fitted::{FittedModel, GaussianCell};
