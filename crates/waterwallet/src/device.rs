//! Tank level tracking, pump motor control and low-level alerts.
//!
//! [`DeviceState`] is created once at startup and changed only through
//! [`DeviceController::report_level`]. Falling to the low threshold starts
//! the motor and raises one alert; the alert is re-armed once the level
//! climbs back above the low threshold. Reaching the high threshold stops
//! the motor.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::validation::ValidationError;

/// Tank level thresholds, in percent of capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    /// At or below this level the motor starts and an alert is sent. Default: 20.
    pub low_pct: f64,
    /// At or above this level the motor stops. Default: 90.
    pub high_pct: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            low_pct: 20.0,
            high_pct: 90.0,
        }
    }
}

impl LevelThresholds {
    /// Both thresholds must lie in 0-100 with `low_pct < high_pct`.
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.low_pct) || !in_range(self.high_pct) {
            return Err(format!(
                "level thresholds must be within 0-100 (low={}, high={})",
                self.low_pct, self.high_pct
            ));
        }
        if self.low_pct >= self.high_pct {
            return Err(format!(
                "low level threshold ({}) must be below the high threshold ({})",
                self.low_pct, self.high_pct
            ));
        }
        Ok(())
    }
}

/// Pump and tank state as last reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub motor_on: bool,
    pub last_level_pct: Option<f64>,
    /// An alert has been sent for the current low-level episode.
    pub notified: bool,
}

/// What a level report changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelTransition {
    pub motor_switched: bool,
    pub alert: bool,
}

impl DeviceState {
    /// Apply one level reading.
    pub fn apply_level(&mut self, level_pct: f64, thresholds: &LevelThresholds) -> LevelTransition {
        let mut transition = LevelTransition::default();
        self.last_level_pct = Some(level_pct);

        if level_pct <= thresholds.low_pct {
            if !self.motor_on {
                self.motor_on = true;
                transition.motor_switched = true;
            }
            if !self.notified {
                self.notified = true;
                transition.alert = true;
            }
            return transition;
        }

        self.notified = false;
        if level_pct >= thresholds.high_pct && self.motor_on {
            self.motor_on = false;
            transition.motor_switched = true;
        }
        transition
    }
}

/// Owns the shared [`DeviceState`] and sends alerts for it.
pub struct DeviceController {
    state: Mutex<DeviceState>,
    thresholds: LevelThresholds,
    notifier: Arc<dyn Notifier>,
}

impl DeviceController {
    pub fn new(thresholds: LevelThresholds, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(DeviceState::default()),
            thresholds,
            notifier,
        }
    }

    pub fn thresholds(&self) -> LevelThresholds {
        self.thresholds
    }

    pub fn snapshot(&self) -> DeviceState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Record a tank level reading and react to threshold crossings.
    ///
    /// Alert delivery failures are logged and do not fail the report.
    pub async fn report_level(&self, level_pct: f64) -> Result<DeviceState, ValidationError> {
        if !level_pct.is_finite() || !(0.0..=100.0).contains(&level_pct) {
            return Err(ValidationError::InvalidField {
                field: "level_pct".to_string(),
                reason: format!("expected a percentage between 0 and 100, got {level_pct}"),
            });
        }

        let (transition, snapshot) = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let transition = state.apply_level(level_pct, &self.thresholds);
            (transition, state.clone())
        };

        if transition.motor_switched {
            info!(
                "Motor turned {} at {level_pct:.1}% tank level",
                if snapshot.motor_on { "on" } else { "off" }
            );
        }
        if transition.alert {
            let message = format!(
                "Water tank level is low ({level_pct:.0}%). The pump motor has been started."
            );
            if let Err(e) = self.notifier.send(&message).await {
                warn!("Failed to deliver low-level alert: {e}");
            }
        }
        Ok(snapshot)
    }
}
