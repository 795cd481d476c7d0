//! Trial ingestion and resampling.
//!
//! - [`Trial`] - raw time-stamped samples of one observed trajectory
//! - [`Condition`] - labelled group of trials with one dimensionality
//! - [`PreparedCondition`] - masked, normalised trials ready for fitting
//! - [`Outline`] - axis-aligned bounds

pub mod condition;
pub mod outline;
pub mod trial;

pub use condition::{Condition, PreparedCondition, TimeNormalization};
pub use outline::Outline;
pub use trial::{infer_dimension, validate_dimension, ResampledTrial, Trial};
