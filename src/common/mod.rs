//! Common utilities shared by the model builders and query evaluators.
//!
//! This module contains linear algebra helpers and the numerical constants
//! and defaults used across the crate.

pub mod constants;
pub mod linalg;
