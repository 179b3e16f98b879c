//! Household water consumption prediction and zone allocation.
//!
//! `waterwallet` is the core behind the WaterWallet dashboard backend. Given
//! whatever weather and household context a client knows, it predicts the
//! day's total consumption and splits it across household zones. It also
//! holds the record types, SQLite store, and pump/tank state the HTTP layer
//! (`waterwallet-web`) serves.
//!
//! # Getting started
//!
//! ```
//! use waterwallet::prelude::*;
//!
//! // No model artifact: predictions come from the built-in heuristic.
//! let planner = AllocationPlanner::new(Predictor::heuristic_only());
//! let plan = planner.plan(None);
//!
//! assert_eq!(plan.prediction.source, PredictionSource::Heuristic);
//! assert_eq!(plan.response.predicted_total_l, 257.4);
//! assert_eq!(plan.response.allocations.kitchen, 90.09);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! partial input ──▶ features::assemble ──▶ Predictor::predict ──▶ allocate ──▶ compose
//!                   (defaults + clock)     (model │ heuristic │ 200 L)       (reply)
//! ```
//!
//! # Where to find things
//!
//! - **Feature defaults and keys:** [`features`].
//! - **Plugging in a trained model:** implement
//!   [`ConsumptionModel`](predict::ConsumptionModel), or ship a TOML
//!   [`LinearPipeline`](predict::LinearPipeline) artifact.
//! - **Fallback formula:** [`predict::heuristic`].
//! - **Zone weights:** [`allocation::Zone`].
//! - **Sensor readings and usage entries:** [`records`] and [`store`].
//! - **Pump motor and low-level alerts:** [`device`] and [`notify`].
//!
//! # Failure policy
//!
//! Prediction never fails. A missing or failing model degrades to the
//! heuristic, a failing heuristic to a fixed 200 L, and the
//! [`PredictionSource`](predict::PredictionSource) on each result says which
//! happened. Only caller input problems surface as errors
//! ([`ValidationError`](validation::ValidationError)).

pub mod allocation;
pub mod device;
pub mod features;
pub mod logging;
pub mod notify;
pub mod planner;
pub mod predict;
pub mod prelude;
pub mod records;
pub mod response;
pub mod store;
pub mod validation;

pub use planner::{AllocationPlanner, Plan};
pub use predict::{Prediction, PredictionSource, Predictor};
pub use response::AllocationResponse;
