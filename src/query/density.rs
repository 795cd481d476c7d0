//! Log-likelihood fields
//!
//! The density at a node is the log of the equal-weight mixture over the
//! model cells. Non-finite values (far from every cell) are replaced by the
//! smallest finite value of the field so downstream consumers never see
//! NaN or infinities.

use crate::errors::ModelError;
use crate::model::FittedModel;

use super::grid::Grid;
use super::output::DensityResult;

/// Evaluate the log-likelihood of `model` at every node of `grid`.
pub fn evaluate(model: &FittedModel, grid: &Grid) -> Result<DensityResult, ModelError> {
    if grid.dimension() != model.dimension() {
        return Err(ModelError::DimensionMismatch {
            expected: model.dimension(),
            actual: grid.dimension(),
            context: "density grid".to_string(),
        });
    }

    let mut values = grid.map_nodes(|point| model.log_likelihood(point))?;

    let floor = values
        .iter()
        .cloned()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    let floor = if floor.is_finite() { floor } else { f64::MIN };
    values.mapv_inplace(|v| if v.is_finite() { v } else { floor });

    Ok(DensityResult {
        label: model.label().to_string(),
        axes: grid.axes().to_vec(),
        values,
    })
}
