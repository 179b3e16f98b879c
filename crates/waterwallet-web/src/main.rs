//! WaterWallet backend server.
//!
//! Serves the dashboard API backed by a SQLite record store. Every flag can
//! also be set through the environment or a `.env` file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p waterwallet-web
//! cargo run -p waterwallet-web -- --port 8080 --model-path models/household.toml
//! DATABASE_URL=sqlite:///var/lib/waterwallet/water.db cargo run -p waterwallet-web
//! ```
//!
//! SMS alerts are sent only when `SMS_GATEWAY_URL`, `SMS_API_KEY` and
//! `SMS_TO` are all set; otherwise low-level alerts are written to the log.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use waterwallet::device::{DeviceController, LevelThresholds};
use waterwallet::logging;
use waterwallet::notify::{LogNotifier, Notifier, SmsConfig, SmsGateway};
use waterwallet::predict::{ConsumptionModel, Predictor, load_model};
use waterwallet::store::Store;
use waterwallet::AllocationPlanner;
use waterwallet_web::{AppState, WebConfig, spawn_web};

/// WaterWallet dashboard API server.
#[derive(Parser, Debug)]
#[command(about = "HTTP API for the WaterWallet household water dashboard")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Record store location.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://water_data.db")]
    database_url: String,

    /// TOML artifact for the consumption model. Without it the heuristic is used.
    #[arg(long, env = "ALLOCATION_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// TOML artifact for scoring sensor readings.
    #[arg(long, env = "READING_MODEL_PATH")]
    reading_model_path: Option<PathBuf>,

    /// SMS provider endpoint.
    #[arg(long, env = "SMS_GATEWAY_URL")]
    sms_gateway_url: Option<String>,

    /// SMS provider API key.
    #[arg(long, env = "SMS_API_KEY", hide_env_values = true)]
    sms_api_key: Option<String>,

    /// Phone number that receives alerts.
    #[arg(long, env = "SMS_TO")]
    sms_to: Option<String>,

    /// Tank level (%) at or below which the motor starts and an alert is sent.
    #[arg(long, env = "LEVEL_LOW_PCT", default_value_t = 20.0)]
    level_low_pct: f64,

    /// Tank level (%) at or above which the motor stops.
    #[arg(long, env = "LEVEL_HIGH_PCT", default_value_t = 90.0)]
    level_high_pct: f64,

    /// Dashboard build directory to serve for unmatched paths.
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

fn build_notifier(args: &Args) -> Result<Arc<dyn Notifier>, String> {
    match (&args.sms_gateway_url, &args.sms_api_key, &args.sms_to) {
        (Some(url), Some(key), Some(to)) => {
            let gateway = SmsGateway::new(SmsConfig::new(url, key, to))
                .map_err(|e| format!("failed to build SMS client: {e}"))?;
            info!("SMS alerts enabled via {url}");
            Ok(Arc::new(gateway))
        }
        (None, None, None) => Ok(Arc::new(LogNotifier)),
        _ => {
            warn!(
                "Incomplete SMS settings (need SMS_GATEWAY_URL, SMS_API_KEY, SMS_TO); \
                 alerts will only be logged"
            );
            Ok(Arc::new(LogNotifier))
        }
    }
}

fn load_reading_model(args: &Args) -> Option<Arc<dyn ConsumptionModel>> {
    let path = args.reading_model_path.as_ref()?;
    match load_model(path) {
        Ok(model) => {
            info!("Reading model '{}' loaded from {}", model.name(), path.display());
            Some(model)
        }
        Err(e) => {
            warn!(
                "Failed to load reading model from {}: {e}; readings are stored without predictions",
                path.display()
            );
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init_tracing(logging::DEFAULT_DIRECTIVES);

    let thresholds = LevelThresholds {
        low_pct: args.level_low_pct,
        high_pct: args.level_high_pct,
    };
    thresholds.validate()?;

    let store = Store::open(&args.database_url)
        .map_err(|e| format!("failed to open record store: {e}"))?;

    let state = AppState {
        planner: Arc::new(AllocationPlanner::new(Predictor::from_path(
            args.model_path.as_deref(),
        ))),
        reading_model: load_reading_model(&args),
        store: Arc::new(store),
        device: Arc::new(DeviceController::new(thresholds, build_notifier(&args)?)),
    };

    let config = WebConfig {
        bind_addr: (args.host, args.port).into(),
        static_dir: args.static_dir.clone(),
    };
    let addr = spawn_web(state, config)
        .await
        .map_err(|e| format!("failed to bind {}:{}: {e}", args.host, args.port))?;
    info!("WaterWallet API listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    info!("Shutting down");
    Ok(())
}
