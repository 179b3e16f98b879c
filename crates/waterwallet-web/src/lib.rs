//! HTTP API for the WaterWallet household water dashboard.
//!
//! `waterwallet-web` exposes the [`waterwallet`] core over an axum server:
//! consumption predictions with zone allocations, sensor reading and usage
//! entry bookkeeping, and tank level reports that drive the pump motor and
//! low-level SMS alerts.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use waterwallet::prelude::*;
//! use waterwallet_web::{AppState, WebConfig, spawn_web};
//!
//! let state = AppState {
//!     planner: Arc::new(AllocationPlanner::new(Predictor::heuristic_only())),
//!     reading_model: None,
//!     store: Arc::new(Store::open("sqlite://water_data.db")?),
//!     device: Arc::new(DeviceController::new(
//!         LevelThresholds::default(),
//!         Arc::new(LogNotifier),
//!     )),
//! };
//! let addr = spawn_web(state, WebConfig::default()).await?;
//! println!("Serving on http://{addr}");
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/` | Status and endpoint index |
//! | GET | `/allocation/predict` | Prediction for the default household profile |
//! | POST | `/allocation/predict/custom` | Prediction for caller-supplied features |
//! | POST / GET | `/api/water-data` | Record / list sensor readings |
//! | POST | `/api/water-level` | Report tank level |
//! | GET | `/api/device-state` | Motor and tank state |
//! | POST | `/waterUsage/addinfo` | Record per-zone usage |
//! | GET | `/waterUsage/detail` | List usage entries |

mod api;
mod error;
mod server;

pub use api::AppState;
pub use error::ApiError;
pub use server::build_router;

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:5000`.
    pub bind_addr: SocketAddr,
    /// Dashboard build directory served for unmatched paths.
    ///
    /// If `None`, unknown paths return a JSON 404 and the dashboard is
    /// served separately.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            static_dir: None,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(state: AppState, config: WebConfig) -> std::io::Result<SocketAddr> {
    let router = server::build_router(state, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
