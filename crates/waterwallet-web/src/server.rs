//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::api::{self, AppState};

/// Build the full axum router.
///
/// The router serves:
/// - The status index at `/`
/// - Allocation predictions at `/allocation/*`
/// - Sensor readings and device control at `/api/*`
/// - Usage entries at `/waterUsage/*`
/// - Optional static files for the dashboard build; otherwise unknown paths
///   get a JSON 404
pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    // The dashboard is served from a different origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/", get(api::index))
        .route("/allocation/predict", get(api::get_default_allocation))
        .route("/allocation/predict/custom", post(api::post_custom_allocation))
        .route(
            "/api/water-data",
            get(api::get_water_data).post(api::post_water_data),
        )
        .route("/api/water-level", post(api::post_water_level))
        .route("/api/device-state", get(api::get_device_state))
        .route("/waterUsage/addinfo", post(api::post_usage))
        .route("/waterUsage/detail", get(api::get_usage))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(api::not_found),
    };

    router.layer(TraceLayer::new_for_http()).layer(cors)
}

/// Bind the listener, spawn the server, and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("HTTP server stopped: {e}");
        }
    });

    Ok(addr)
}
