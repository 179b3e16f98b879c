//! Feature assembly.
//!
//! A prediction request carries an arbitrary subset of the features the
//! consumption model was trained on. [`assemble`] layers that partial input
//! over a complete default template and fills in the clock-derived fields, so
//! the predictor always sees every key it may need.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::{self, ValidationError};

// ── Feature keys ───────────────────────────────────────────────────

pub const TEMPERATURE: &str = "temperature_C";
pub const HUMIDITY: &str = "humidity_%";
pub const RAIN_RECENT: &str = "rain_recent_mm";
pub const STATE: &str = "state";
pub const SEASON: &str = "season";
pub const CLIMATE: &str = "climate";
pub const HOUR: &str = "hour";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const VALVE_STATE: &str = "valve_state";
pub const RAINWATER_HARVESTED: &str = "rainwater_harvested_L";
pub const WATER_PRESSURE: &str = "water_pressure";
pub const POPULATION_DENSITY: &str = "population_density";

/// Per-zone consumption sub-totals. The model was trained with them as
/// inputs; they default to zero and are never echoed back to callers.
pub const CONSUMPTION_PLACEHOLDERS: [&str; 4] = ["kitchen_L", "bathroom_L", "garden_L", "outdoor_L"];

/// Keys whose values must be numbers when a caller supplies them.
pub const NUMERIC_FEATURES: [&str; 13] = [
    TEMPERATURE,
    HUMIDITY,
    RAIN_RECENT,
    HOUR,
    DAY_OF_WEEK,
    VALVE_STATE,
    RAINWATER_HARVESTED,
    WATER_PRESSURE,
    POPULATION_DENSITY,
    CONSUMPTION_PLACEHOLDERS[0],
    CONSUMPTION_PLACEHOLDERS[1],
    CONSUMPTION_PLACEHOLDERS[2],
    CONSUMPTION_PLACEHOLDERS[3],
];

/// Keys whose values must be category labels when a caller supplies them.
pub const CATEGORICAL_FEATURES: [&str; 3] = [STATE, SEASON, CLIMATE];

// ── FeatureRecord ──────────────────────────────────────────────────

/// A single row of named model inputs.
///
/// Serializes as a flat JSON object. Unknown keys supplied by a caller are
/// kept and passed through to the model untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord(Map<String, Value>);

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Numeric value of `key`. Booleans read as 0 / 1.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// String value of `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// The record with the consumption placeholders removed, as echoed back
    /// in prediction responses.
    pub fn echo(&self) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(k, _)| !CONSUMPTION_PLACEHOLDERS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<Map<String, Value>> for FeatureRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FeatureRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── Template and assembly ──────────────────────────────────────────

/// The complete default feature set. Clock-derived fields are left out so
/// that [`assemble`] fills them from the current time.
pub fn default_template() -> FeatureRecord {
    let mut record: FeatureRecord = [
        (TEMPERATURE, Value::from(30)),
        (HUMIDITY, Value::from(60)),
        (RAIN_RECENT, Value::from(5)),
        (STATE, Value::from("Karnataka")),
        (SEASON, Value::from("Summer")),
        (CLIMATE, Value::from("Tropical")),
        (VALVE_STATE, Value::from(1)),
        (RAINWATER_HARVESTED, Value::from(100)),
        (WATER_PRESSURE, Value::from(0)),
        (POPULATION_DENSITY, Value::from(0)),
    ]
    .into_iter()
    .collect();
    for key in CONSUMPTION_PLACEHOLDERS {
        record.insert(key, 0);
    }
    record
}

/// Build a complete feature record from optional caller overrides, reading
/// the local wall clock for any missing time fields.
pub fn assemble(overrides: Option<&Map<String, Value>>) -> FeatureRecord {
    assemble_at(overrides, Local::now().naive_local())
}

/// [`assemble`] with an explicit clock reading.
///
/// Caller values win over the template. `null` overrides are skipped and
/// leave the default in place. A missing `hour` or `day_of_week` is taken
/// from `now`; both come from the same instant.
pub fn assemble_at(overrides: Option<&Map<String, Value>>, now: NaiveDateTime) -> FeatureRecord {
    let mut record = default_template();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            if !value.is_null() {
                record.insert(key.clone(), value.clone());
            }
        }
    }
    if !record.contains(HOUR) {
        record.insert(HOUR, now.hour());
    }
    if !record.contains(DAY_OF_WEEK) {
        record.insert(DAY_OF_WEEK, now.weekday().num_days_from_monday());
    }
    record
}

/// Check caller overrides before assembly: known numeric features must be
/// numbers, known categorical features must be strings. Unknown keys are not
/// inspected.
pub fn validate_overrides(overrides: &Map<String, Value>) -> Result<(), ValidationError> {
    for key in NUMERIC_FEATURES {
        validation::optional_number(overrides, key)?;
    }
    for key in CATEGORICAL_FEATURES {
        validation::optional_string(overrides, key)?;
    }
    Ok(())
}
