//! Integration tests for the waterwallet-web server.
//!
//! These tests start a real axum server on a random port and exercise
//! the REST endpoints.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde_json::{Value, json};
use waterwallet::device::{DeviceController, LevelThresholds};
use waterwallet::notify::{LogNotifier, Notifier, SmsConfig, SmsGateway};
use waterwallet::predict::{ConsumptionModel, LinearPipeline, Predictor};
use waterwallet::store::Store;
use waterwallet::AllocationPlanner;
use waterwallet_web::{AppState, WebConfig, spawn_web};

const READING_MODEL: &str = r#"
name = "reading-test"
intercept = 10.0

[numeric]
flow_rate = 2.0
pipe_pressure = 0.5
total_consumption = 0.25
"#;

fn state_with(
    planner: AllocationPlanner,
    reading_model: Option<Arc<dyn ConsumptionModel>>,
    notifier: Arc<dyn Notifier>,
) -> AppState {
    AppState {
        planner: Arc::new(planner),
        reading_model,
        store: Arc::new(Store::open_in_memory().unwrap()),
        device: Arc::new(DeviceController::new(LevelThresholds::default(), notifier)),
    }
}

/// Helper: spawn a server on port 0 (random available port).
async fn spawn_server(state: AppState) -> String {
    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        ..Default::default()
    };
    let addr = spawn_web(state, config).await.unwrap();
    format!("http://{addr}")
}

async fn spawn_default_server() -> String {
    let reading_model = LinearPipeline::from_toml_str(READING_MODEL).unwrap();
    spawn_server(state_with(
        AllocationPlanner::new(Predictor::heuristic_only()),
        Some(Arc::new(reading_model)),
        Arc::new(LogNotifier),
    ))
    .await
}

async fn post_json(url: String, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ── Index and fallback ───────────────────────────────────────────────

#[tokio::test]
async fn index_reports_status() {
    let base = spawn_default_server().await;
    let resp = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Water Management System is running");
    assert_eq!(json["endpoints"]["allocation"][1], "/allocation/predict/custom");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let base = spawn_default_server().await;
    let resp = reqwest::get(format!("{base}/no/such/path")).await.unwrap();
    assert_eq!(resp.status(), 404);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Endpoint not found");
}

#[tokio::test]
async fn cors_headers_are_present() {
    let base = spawn_default_server().await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/"))
        .header("Origin", "http://localhost:8081")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

// ── Allocation ───────────────────────────────────────────────────────

#[tokio::test]
async fn default_prediction_uses_heuristic_profile() {
    let base = spawn_default_server().await;
    let resp = reqwest::get(format!("{base}/allocation/predict")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["predicted_total_L"], json!(257.4));
    assert_eq!(json["allocations"]["kitchen"], json!(90.09));
    assert_eq!(json["allocations"]["bathroom"], json!(102.96));
    assert_eq!(json["allocations"]["garden"], json!(38.61));
    assert_eq!(json["allocations"]["outdoor"], json!(25.74));
    assert_eq!(json["rainwater_harvested_L"], json!(100.0));
    assert_eq!(json["input_data"]["state"], "Karnataka");
    assert!(json["input_data"].get("kitchen_L").is_none());
    assert!(json["input_data"]["hour"].is_u64());
}

#[tokio::test]
async fn custom_prediction_applies_overrides() {
    let base = spawn_default_server().await;
    let resp = post_json(
        format!("{base}/allocation/predict/custom"),
        json!({"season": "Winter", "rainwater_harvested_L": 0, "hour": 7, "meter": "m-1"}),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    // 200 * 1.1 * 0.9 * 0.8
    assert_eq!(json["predicted_total_L"], json!(158.4));
    assert_eq!(json["rainwater_harvested_L"], json!(0.0));
    assert_eq!(json["input_data"]["hour"], 7);
    assert_eq!(json["input_data"]["meter"], "m-1");
}

#[tokio::test]
async fn custom_prediction_uses_loaded_model() {
    let model = LinearPipeline::from_toml_str(
        r#"
intercept = 50.0
[numeric]
temperature_C = 10.0
"#,
    )
    .unwrap();
    let base = spawn_server(state_with(
        AllocationPlanner::new(Predictor::new(Some(Arc::new(model)))),
        None,
        Arc::new(LogNotifier),
    ))
    .await;

    let resp = post_json(
        format!("{base}/allocation/predict/custom"),
        json!({"temperature_C": 20}),
    )
    .await;
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["predicted_total_L"], json!(250.0));
    assert_eq!(json["allocations"]["bathroom"], json!(100.0));
}

#[tokio::test]
async fn custom_prediction_rejects_empty_body() {
    let base = spawn_default_server().await;
    let resp = post_json(format!("{base}/allocation/predict/custom"), json!({})).await;
    assert_eq!(resp.status(), 400);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "No input data provided");
}

#[tokio::test]
async fn custom_prediction_rejects_text_temperature() {
    let base = spawn_default_server().await;
    let resp = post_json(
        format!("{base}/allocation/predict/custom"),
        json!({"temperature_C": "hot"}),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["field"], "temperature_C");
}

#[tokio::test]
async fn custom_prediction_rejects_malformed_json() {
    let base = spawn_default_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/allocation/predict/custom"))
        .header("content-type", "application/json")
        .body("{\"season\":")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ── Sensor readings ──────────────────────────────────────────────────

#[tokio::test]
async fn water_data_is_scored_stored_and_listed() {
    let base = spawn_default_server().await;

    let resp = post_json(
        format!("{base}/api/water-data"),
        json!({"flow_rate": 5.0, "pipe_pressure": 40.0, "total_consumption": 100.0}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "success");
    // 10 + 2*5 + 0.5*40 + 0.25*100
    assert_eq!(json["prediction"], json!(65.0));

    post_json(
        format!("{base}/api/water-data"),
        json!({"flow_rate": 9.0, "pipe_pressure": 12.0, "total_consumption": 300.0, "leak_detected": true}),
    )
    .await;

    let all: Value = reqwest::get(format!("{base}/api/water-data"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = all["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["flow_rate"], json!(9.0));
    assert!(rows[0]["timestamp"].is_string());

    let leaks: Value = reqwest::get(format!("{base}/api/water-data?leak_only=true&limit=5"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = leaks["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["leak_detected"], true);
}

#[tokio::test]
async fn water_data_query_errors_are_json() {
    let base = spawn_default_server().await;
    for query in ["limit=-1", "leak_only=maybe"] {
        let resp = reqwest::get(format!("{base}/api/water-data?{query}")).await.unwrap();
        assert_eq!(resp.status(), 400, "{query}");

        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "error", "{query}");
        assert!(json["message"].is_string(), "{query}");
    }
}

#[tokio::test]
async fn concurrent_readings_are_all_stored() {
    let base = spawn_default_server().await;
    let mut posts = tokio::task::JoinSet::new();
    for i in 0..16 {
        posts.spawn(post_json(
            format!("{base}/api/water-data"),
            json!({"flow_rate": i, "pipe_pressure": 1.0, "total_consumption": 2.0}),
        ));
    }
    while let Some(resp) = posts.join_next().await {
        assert_eq!(resp.unwrap().status(), 200);
    }

    let all: Value = reqwest::get(format!("{base}/api/water-data?limit=50"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["data"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn water_data_requires_measurements() {
    let base = spawn_default_server().await;
    let resp = post_json(format!("{base}/api/water-data"), json!({"flow_rate": 5.0})).await;
    assert_eq!(resp.status(), 400);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(
        json["message"],
        "Missing required fields: total_consumption, pipe_pressure"
    );
}

#[tokio::test]
async fn water_data_without_reading_model_stores_null_prediction() {
    let base = spawn_server(state_with(
        AllocationPlanner::default(),
        None,
        Arc::new(LogNotifier),
    ))
    .await;
    let resp = post_json(
        format!("{base}/api/water-data"),
        json!({"flow_rate": 1, "pipe_pressure": 2, "total_consumption": 3}),
    )
    .await;
    let json: Value = resp.json().await.unwrap();
    assert!(json["prediction"].is_null());
}

// ── Usage entries ────────────────────────────────────────────────────

#[tokio::test]
async fn usage_entries_are_stored_and_listed() {
    let base = spawn_default_server().await;

    let resp = post_json(
        format!("{base}/waterUsage/addinfo"),
        json!({"kitchen": 42.5, "bathroom": 80, "outdoor": 15, "weather": "sunny", "temperature": 31}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Water usage data added successfully.");

    let detail: Value = reqwest::get(format!("{base}/waterUsage/detail"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = detail["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kitchen"], json!(42.5));
    assert_eq!(rows[0]["weather"], "sunny");
    assert!(rows[0]["rainfall"].is_null());
}

#[tokio::test]
async fn usage_entry_with_text_kitchen_names_the_field() {
    let base = spawn_default_server().await;
    let resp = post_json(format!("{base}/waterUsage/addinfo"), json!({"kitchen": "abc"})).await;
    assert_eq!(resp.status(), 400);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["field"], "kitchen");
    assert!(json["message"].as_str().unwrap().contains("kitchen"));
}

// ── Device ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<Value>>>);

async fn receive_sms(State(inbox): State<Inbox>, Json(body): Json<Value>) -> Json<Value> {
    inbox.0.lock().unwrap().push(body);
    Json(json!({"queued": true}))
}

/// Spawn a fake SMS provider that records every message it receives.
async fn spawn_sms_provider() -> (String, Inbox) {
    let inbox = Inbox::default();
    let router = Router::new()
        .route("/sms", post(receive_sms))
        .with_state(inbox.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/sms"), inbox)
}

#[tokio::test]
async fn low_level_starts_motor_and_sends_one_sms() {
    let (sms_url, inbox) = spawn_sms_provider().await;
    let gateway = SmsGateway::new(SmsConfig::new(sms_url, "test-key", "+15550100")).unwrap();
    let base = spawn_server(state_with(
        AllocationPlanner::default(),
        None,
        Arc::new(gateway),
    ))
    .await;

    let resp = post_json(format!("{base}/api/water-level"), json!({"level_pct": 12})).await;
    assert_eq!(resp.status(), 200);
    let state: Value = resp.json().await.unwrap();
    assert_eq!(state["motor_on"], true);
    assert_eq!(state["notified"], true);

    post_json(format!("{base}/api/water-level"), json!({"level_pct": 8})).await;
    {
        let sent = inbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["to"], "+15550100");
        assert!(sent[0]["message"].as_str().unwrap().contains("12%"));
    }

    post_json(format!("{base}/api/water-level"), json!({"level_pct": 95})).await;
    let state: Value = reqwest::get(format!("{base}/api/device-state"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["motor_on"], false);
    assert_eq!(state["notified"], false);
    assert_eq!(state["last_level_pct"], json!(95.0));
}

#[tokio::test]
async fn water_level_is_validated() {
    let base = spawn_default_server().await;

    let resp = post_json(format!("{base}/api/water-level"), json!({"level_pct": 120})).await;
    assert_eq!(resp.status(), 400);

    let resp = post_json(format!("{base}/api/water-level"), json!({"depth": 3})).await;
    assert_eq!(resp.status(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["field"], "level_pct");
}

// ── Persistence ──────────────────────────────────────────────────────

#[tokio::test]
async fn usage_entries_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("water.db").display());

    let first = spawn_server(AppState {
        store: Arc::new(Store::open(&url).unwrap()),
        ..state_with(AllocationPlanner::default(), None, Arc::new(LogNotifier))
    })
    .await;
    post_json(
        format!("{first}/waterUsage/addinfo"),
        json!({"kitchen": 10, "bathroom": 20, "outdoor": 5}),
    )
    .await;

    let second = spawn_server(AppState {
        store: Arc::new(Store::open(&url).unwrap()),
        ..state_with(AllocationPlanner::default(), None, Arc::new(LogNotifier))
    })
    .await;
    let detail: Value = reqwest::get(format!("{second}/waterUsage/detail"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["data"].as_array().unwrap().len(), 1);
    assert_eq!(detail["data"][0]["weather"], "unknown");
}
