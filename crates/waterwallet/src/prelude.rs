//! Convenience re-exports for common `waterwallet` types.
//!
//! ```ignore
//! use waterwallet::prelude::*;
//! ```

pub use crate::allocation::{Allocation, Zone, allocate};
pub use crate::device::{DeviceController, DeviceState, LevelThresholds};
pub use crate::features::{FeatureRecord, assemble};
pub use crate::notify::{LogNotifier, Notifier, SmsConfig, SmsGateway};
pub use crate::planner::{AllocationPlanner, Plan};
pub use crate::predict::{
    ConsumptionModel, LinearPipeline, ModelError, Prediction, PredictionSource, Predictor,
};
pub use crate::records::{SensorReading, StoredReading, StoredUsage, UsageEntry};
pub use crate::response::AllocationResponse;
pub use crate::store::{Store, StoreError};
pub use crate::validation::ValidationError;
