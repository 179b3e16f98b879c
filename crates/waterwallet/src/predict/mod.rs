//! Consumption prediction.
//!
//! [`Predictor`] wraps an optional external model. Prediction never fails:
//! when the model is absent or errors, the closed-form [`heuristic`] is used,
//! and if that fails too the fixed [`DEFAULT_PREDICTION_L`] is returned. The
//! [`PredictionSource`] on the result records which path produced it.

pub mod heuristic;
pub mod model;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::features::FeatureRecord;

pub use model::{ConsumptionModel, LinearPipeline, ModelError, load_model};

/// Returned when neither the model nor the heuristic produced a value.
pub const DEFAULT_PREDICTION_L: f64 = 200.0;

/// Which path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    Heuristic,
    Default,
}

/// A non-negative liters estimate and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub liters: f64,
    pub source: PredictionSource,
}

impl Prediction {
    fn new(liters: f64, source: PredictionSource) -> Self {
        Self {
            liters: liters.max(0.0),
            source,
        }
    }

    /// True when the value did not come from the trained model.
    pub fn is_fallback(&self) -> bool {
        self.source != PredictionSource::Model
    }
}

/// Process-lifetime prediction entry point.
///
/// The model slot is fixed at construction; there is no reload.
#[derive(Clone, Default)]
pub struct Predictor {
    model: Option<Arc<dyn ConsumptionModel>>,
}

impl Predictor {
    pub fn new(model: Option<Arc<dyn ConsumptionModel>>) -> Self {
        Self { model }
    }

    /// A predictor that always uses the heuristic.
    pub fn heuristic_only() -> Self {
        Self { model: None }
    }

    /// Load the model artifact at `path`, if one is configured.
    ///
    /// A load failure is logged and leaves the predictor on the heuristic.
    pub fn from_path(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No consumption model configured; using heuristic estimates");
            return Self::heuristic_only();
        };
        match load_model(path) {
            Ok(model) => {
                info!(
                    "Consumption model '{}' loaded from {}",
                    model.name(),
                    path.display()
                );
                Self::new(Some(model))
            }
            Err(e) => {
                warn!(
                    "Failed to load consumption model from {}: {e}; using heuristic estimates",
                    path.display()
                );
                Self::heuristic_only()
            }
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Predict total consumption in liters for one feature record.
    pub fn predict(&self, features: &FeatureRecord) -> Prediction {
        if let Some(model) = &self.model {
            match model.predict(features) {
                Ok(liters) if liters.is_finite() => {
                    debug!("Model '{}' predicted {liters:.2} L", model.name());
                    return Prediction::new(liters, PredictionSource::Model);
                }
                Ok(_) => warn!(
                    "Model '{}' returned a non-finite value; falling back to heuristic",
                    model.name()
                ),
                Err(e) => warn!(
                    "Model '{}' failed: {e}; falling back to heuristic",
                    model.name()
                ),
            }
        }

        match heuristic::estimate(features) {
            Ok(liters) => {
                debug!("Heuristic estimated {liters:.2} L");
                Prediction::new(liters, PredictionSource::Heuristic)
            }
            Err(e) => {
                warn!("Heuristic estimate failed: {e}; using default {DEFAULT_PREDICTION_L} L");
                Prediction::new(DEFAULT_PREDICTION_L, PredictionSource::Default)
            }
        }
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("model", &self.model.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}
