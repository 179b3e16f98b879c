//! External consumption models.
//!
//! The trained model is an opaque artifact: the predictor only needs
//! "feature row in, liters out". [`ConsumptionModel`] is that seam.
//! [`LinearPipeline`] is the artifact format this crate ships with, a
//! TOML-serialized linear regression with one-hot encoded categories.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureRecord;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("feature '{0}' is missing from the record")]
    MissingFeature(String),
    #[error("feature '{0}' is not numeric")]
    NotNumeric(String),
    #[error("feature '{0}' is not a category label")]
    NotCategorical(String),
    #[error("prediction is not a finite number")]
    NonFinite,
}

/// A trained regression that maps one feature row to a liters estimate.
///
/// Implementations must be read-only after construction; the same instance
/// serves concurrent requests.
pub trait ConsumptionModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Predict from one complete feature row.
    fn predict(&self, features: &FeatureRecord) -> Result<f64, ModelError>;
}

/// Linear regression over numeric features plus one-hot categorical terms.
///
/// ```toml
/// name = "household-v1"
/// intercept = 120.0
/// clamp_non_negative = true
///
/// [numeric]
/// temperature_C = 2.5
/// "humidity_%" = -0.4
///
/// [categorical.season]
/// Summer = 40.0
/// Winter = -25.0
/// ```
///
/// Category labels match case-insensitively. A label the model has no
/// coefficient for contributes nothing, the way an encoder that ignores
/// unknown categories behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPipeline {
    #[serde(default = "default_name")]
    pub name: String,
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
    /// Clamp negative outputs to zero.
    #[serde(default)]
    pub clamp_non_negative: bool,
}

fn default_name() -> String {
    "linear-pipeline".to_string()
}

impl LinearPipeline {
    /// Load an artifact from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(text)?)
    }

    fn categorical_term(
        &self,
        feature: &str,
        coefficients: &BTreeMap<String, f64>,
        record: &FeatureRecord,
    ) -> Result<f64, ModelError> {
        let value = record
            .get(feature)
            .ok_or_else(|| ModelError::MissingFeature(feature.to_string()))?;
        let label = value
            .as_str()
            .ok_or_else(|| ModelError::NotCategorical(feature.to_string()))?;
        Ok(coefficients
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(label))
            .map_or(0.0, |(_, weight)| *weight))
    }
}

impl ConsumptionModel for LinearPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        let mut total = self.intercept;
        for (feature, weight) in &self.numeric {
            if !record.contains(feature) {
                return Err(ModelError::MissingFeature(feature.clone()));
            }
            let value = record
                .number(feature)
                .ok_or_else(|| ModelError::NotNumeric(feature.clone()))?;
            total += weight * value;
        }
        for (feature, coefficients) in &self.categorical {
            total += self.categorical_term(feature, coefficients, record)?;
        }
        if !total.is_finite() {
            return Err(ModelError::NonFinite);
        }
        Ok(if self.clamp_non_negative {
            total.max(0.0)
        } else {
            total
        })
    }
}

/// Load the model artifact at `path` as a shareable trait object.
pub fn load_model(path: impl AsRef<Path>) -> Result<Arc<dyn ConsumptionModel>, ModelError> {
    Ok(Arc::new(LinearPipeline::load(path)?))
}
