//! Closed-form consumption estimate used when no trained model is available.

use crate::features::{FeatureRecord, HUMIDITY, SEASON, TEMPERATURE};

use super::model::ModelError;

/// Baseline daily household consumption in liters.
pub const BASE_LITERS: f64 = 200.0;

/// Seasonal demand multipliers, matched case-insensitively.
pub const SEASON_FACTORS: [(&str, f64); 5] = [
    ("summer", 1.3),
    ("winter", 0.8),
    ("monsoon", 0.7),
    ("autumn", 0.9),
    ("spring", 1.1),
];

/// Above 25 °C demand grows by 2% per degree; below it stays at baseline.
pub fn temperature_factor(temperature_c: f64) -> f64 {
    1.0 + ((temperature_c - 25.0) / 50.0).max(0.0)
}

/// Humid air lowers demand, by at most 30%.
pub fn humidity_factor(humidity_pct: f64) -> f64 {
    1.0 - ((humidity_pct - 40.0) / 200.0).min(0.3)
}

/// Multiplier for a season label; unrecognized labels are neutral.
pub fn season_factor(season: &str) -> f64 {
    SEASON_FACTORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(season.trim()))
        .map_or(1.0, |(_, factor)| *factor)
}

/// Estimate liters from temperature, humidity and season.
///
/// Temperature and humidity must be numeric. A missing or non-text season is
/// treated as unrecognized.
pub fn estimate(features: &FeatureRecord) -> Result<f64, ModelError> {
    let temperature = required_number(features, TEMPERATURE)?;
    let humidity = required_number(features, HUMIDITY)?;
    let season = features.text(SEASON).map_or(1.0, season_factor);

    let liters = BASE_LITERS * temperature_factor(temperature) * humidity_factor(humidity) * season;
    if liters.is_finite() {
        Ok(liters)
    } else {
        Err(ModelError::NonFinite)
    }
}

fn required_number(features: &FeatureRecord, key: &str) -> Result<f64, ModelError> {
    if !features.contains(key) {
        return Err(ModelError::MissingFeature(key.to_string()));
    }
    features
        .number(key)
        .ok_or_else(|| ModelError::NotNumeric(key.to_string()))
}
