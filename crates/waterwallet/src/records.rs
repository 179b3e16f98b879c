//! Sensor readings and per-zone usage entries submitted by clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::features::FeatureRecord;
use crate::validation::{self, ValidationError};

// ── Sensor readings ────────────────────────────────────────────────

/// One reading from the flow meter and pressure sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Liters per minute.
    pub flow_rate: f64,
    /// Liters.
    pub total_consumption: f64,
    /// PSI.
    pub pipe_pressure: f64,
    pub leak_detected: bool,
}

impl SensorReading {
    pub const REQUIRED: [&'static str; 3] = ["flow_rate", "total_consumption", "pipe_pressure"];

    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let [flow_rate, total_consumption, pipe_pressure] =
            validation::required_numbers(body, Self::REQUIRED)?;
        Ok(Self {
            flow_rate,
            total_consumption,
            pipe_pressure,
            leak_detected: validation::optional_bool(body, "leak_detected")?.unwrap_or(false),
        })
    }

    /// Inputs for the reading model.
    pub fn features(&self) -> FeatureRecord {
        [
            ("flow_rate", self.flow_rate),
            ("pipe_pressure", self.pipe_pressure),
            ("total_consumption", self.total_consumption),
        ]
        .into_iter()
        .collect()
    }
}

/// A persisted reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: SensorReading,
    pub prediction: Option<f64>,
}

// ── Usage entries ──────────────────────────────────────────────────

/// Liters used per zone over a reporting period, with optional weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub kitchen: f64,
    pub bathroom: f64,
    pub outdoor: f64,
    pub weather: String,
    /// mm
    pub rainfall: Option<f64>,
    /// °C
    pub temperature: Option<f64>,
}

impl UsageEntry {
    pub const REQUIRED: [&'static str; 3] = ["kitchen", "bathroom", "outdoor"];

    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let [kitchen, bathroom, outdoor] = validation::required_numbers(body, Self::REQUIRED)?;
        Ok(Self {
            kitchen,
            bathroom,
            outdoor,
            weather: validation::optional_string(body, "weather")?
                .unwrap_or_else(|| "unknown".to_string()),
            rainfall: validation::optional_number(body, "rainfall")?,
            temperature: validation::optional_number(body, "temperature")?,
        })
    }
}

/// A persisted usage entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUsage {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: UsageEntry,
}
