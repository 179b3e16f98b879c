//! The prediction reply returned to dashboard clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::allocation::{Allocation, allocate, round2};
use crate::features::{FeatureRecord, RAINWATER_HARVESTED};
use crate::predict::Prediction;

/// Liters reported as harvested while the harvesting tank is active.
pub const RAINWATER_HARVESTED_L: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResponse {
    #[serde(rename = "predicted_total_L")]
    pub predicted_total_l: f64,
    pub allocations: Allocation,
    #[serde(rename = "rainwater_harvested_L")]
    pub rainwater_harvested_l: f64,
    /// The normalized input, without consumption placeholders.
    pub input_data: Map<String, Value>,
}

/// Assemble the reply for one prediction.
///
/// Allocation works from the unrounded total; only the reported total is
/// rounded to two decimals.
pub fn compose(features: &FeatureRecord, prediction: &Prediction) -> AllocationResponse {
    let harvesting = features
        .number(RAINWATER_HARVESTED)
        .is_some_and(|liters| liters > 0.0);
    AllocationResponse {
        predicted_total_l: round2(prediction.liters),
        allocations: allocate(prediction.liters),
        rainwater_harvested_l: if harvesting { RAINWATER_HARVESTED_L } else { 0.0 },
        input_data: features.echo(),
    }
}
