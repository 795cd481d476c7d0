//! Mean trajectory extraction

use crate::model::FittedModel;

use super::output::MeanResult;

/// Cell centres of `model` ordered from start to end.
pub fn extract_mean(model: &FittedModel) -> MeanResult {
    MeanResult {
        label: model.label().to_string(),
        points: model.mean_points(),
    }
}
