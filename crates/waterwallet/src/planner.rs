//! End-to-end allocation planning: assemble → predict → allocate → compose.

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::features;
use crate::predict::{Prediction, Predictor};
use crate::response::{AllocationResponse, compose};
use crate::validation::ValidationError;

/// A planned allocation together with the prediction behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub response: AllocationResponse,
    pub prediction: Prediction,
}

/// Runs the prediction pipeline against a fixed [`Predictor`].
#[derive(Debug, Clone, Default)]
pub struct AllocationPlanner {
    predictor: Predictor,
}

impl AllocationPlanner {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }

    /// Plan from optional overrides using the current local time.
    pub fn plan(&self, overrides: Option<&Map<String, Value>>) -> Plan {
        self.plan_at(overrides, Local::now().naive_local())
    }

    /// Plan with an explicit clock reading for the time-derived features.
    pub fn plan_at(&self, overrides: Option<&Map<String, Value>>, now: NaiveDateTime) -> Plan {
        let record = features::assemble_at(overrides, now);
        let prediction = self.predictor.predict(&record);
        debug!("Planned {:.2} L from {:?}", prediction.liters, prediction.source);
        Plan {
            response: compose(&record, &prediction),
            prediction,
        }
    }

    /// Validate caller overrides, then plan.
    pub fn plan_checked(&self, overrides: &Map<String, Value>) -> Result<Plan, ValidationError> {
        features::validate_overrides(overrides)?;
        Ok(self.plan(Some(overrides)))
    }
}
