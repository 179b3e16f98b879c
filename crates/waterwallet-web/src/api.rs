//! REST endpoint handlers.
//!
//! Request bodies are taken as raw bytes and validated by the core, so a
//! malformed field produces a JSON error naming it rather than a generic
//! extractor rejection.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use waterwallet::device::{DeviceController, DeviceState};
use waterwallet::predict::ConsumptionModel;
use waterwallet::records::{SensorReading, UsageEntry};
use waterwallet::store::{Store, StoreError};
use waterwallet::validation::{self, ValidationError};
use waterwallet::{AllocationPlanner, AllocationResponse};

use crate::error::ApiError;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<AllocationPlanner>,
    /// Optional model scoring raw sensor readings.
    pub reading_model: Option<Arc<dyn ConsumptionModel>>,
    pub store: Arc<Store>,
    pub device: Arc<DeviceController>,
}

/// GET /: Service status and endpoint index.
pub async fn index() -> Json<Value> {
    Json(json!({
        "status": "Water Management System is running",
        "endpoints": {
            "allocation": ["/allocation/predict", "/allocation/predict/custom"],
            "sensor_data": ["/api/water-data"],
            "usage": ["/waterUsage/addinfo", "/waterUsage/detail"],
            "device": ["/api/water-level", "/api/device-state"],
        }
    }))
}

/// Run a record store call on the blocking thread pool.
async fn with_store<T, F>(app: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&app.store);
    Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
}

// ── Allocation ─────────────────────────────────────────────────────

/// GET /allocation/predict: Prediction for the default household profile.
pub async fn get_default_allocation(State(app): State<AppState>) -> Json<AllocationResponse> {
    Json(app.planner.plan(None).response)
}

/// POST /allocation/predict/custom: Prediction for caller-supplied features.
///
/// Returns 400 if the body is empty or a known feature has the wrong type.
pub async fn post_custom_allocation(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<AllocationResponse>, ApiError> {
    let overrides = validation::parse_object(&body)?;
    let plan = app.planner.plan_checked(&overrides)?;
    Ok(Json(plan.response))
}

// ── Sensor readings ────────────────────────────────────────────────

/// POST /api/water-data: Record a flow/pressure reading.
///
/// When a reading model is loaded its prediction is stored alongside the
/// reading. A failing model stores no prediction.
pub async fn post_water_data(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = validation::parse_object(&body)?;
    let reading = SensorReading::from_json(&body)?;

    let prediction = app.reading_model.as_ref().and_then(|model| {
        match model.predict(&reading.features()) {
            Ok(value) if value.is_finite() => Some(value),
            Ok(_) => {
                warn!("Reading model '{}' returned a non-finite value", model.name());
                None
            }
            Err(e) => {
                warn!("Reading model '{}' failed: {e}", model.name());
                None
            }
        }
    });

    let stored = with_store(&app, move |store| store.insert_reading(&reading, prediction)).await?;
    debug!(
        "Stored reading {} (leak={})",
        stored.id, stored.reading.leak_detected
    );
    Ok(Json(json!({
        "status": "success",
        "message": "Water data received and processed",
        "prediction": stored.prediction,
    })))
}

/// Query parameters for GET /api/water-data.
#[derive(Debug, Deserialize)]
pub struct ReadingQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub leak_only: bool,
}

fn default_limit() -> usize {
    100
}

/// GET /api/water-data: Recent readings, newest first.
///
/// Returns 400 if `limit` or `leak_only` cannot be parsed.
pub async fn get_water_data(
    State(app): State<AppState>,
    query: Result<Query<ReadingQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let data =
        with_store(&app, move |store| store.list_readings(query.limit, query.leak_only)).await?;
    Ok(Json(json!({"status": "success", "data": data})))
}

// ── Usage entries ──────────────────────────────────────────────────

/// POST /waterUsage/addinfo: Record per-zone usage.
pub async fn post_usage(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = validation::parse_object(&body)?;
    let entry = UsageEntry::from_json(&body)?;
    let stored = with_store(&app, move |store| store.insert_usage(&entry)).await?;
    debug!("Stored usage entry {}", stored.id);
    Ok(Json(json!({
        "status": "success",
        "message": "Water usage data added successfully.",
    })))
}

/// GET /waterUsage/detail: All usage entries, newest first.
pub async fn get_usage(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    let data = with_store(&app, |store| store.list_usage()).await?;
    Ok(Json(json!({"status": "success", "data": data})))
}

// ── Device ─────────────────────────────────────────────────────────

/// POST /api/water-level: Report the tank level in percent.
///
/// Returns the device state after the report.
pub async fn post_water_level(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<DeviceState>, ApiError> {
    let body = validation::parse_object(&body)?;
    let level = validation::optional_number(&body, "level_pct")?
        .ok_or_else(|| ValidationError::MissingFields(vec!["level_pct".to_string()]))?;
    let state = app.device.report_level(level).await?;
    Ok(Json(state))
}

/// GET /api/device-state: Current motor and tank state.
pub async fn get_device_state(State(app): State<AppState>) -> Json<DeviceState> {
    Json(app.device.snapshot())
}

/// Fallback for unknown routes.
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Endpoint not found"})),
    )
}
