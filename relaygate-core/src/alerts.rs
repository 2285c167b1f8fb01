//! Edge-Triggered Threshold Alerts
//!
//! ## Overview
//!
//! Each alert kind compares one cached value against a fixed threshold. The
//! evaluator remembers whether each alert is currently active and only reports
//! transitions:
//!
//! ```text
//! condition:  ___/‾‾‾‾‾‾‾‾‾\___/‾‾‾‾
//! reported:      ↑ Raised  ↓   ↑ Raised
//!                          Cleared
//! ```
//!
//! A reading that keeps the condition true raises nothing. A reading that makes
//! it false resets the latch and reports `Cleared`, so the caller can turn off
//! an indicator; there is no alert for clearing.
//!
//! ## Comparisons
//!
//! | Kind           | Field              | Active when        |
//! |----------------|--------------------|--------------------|
//! | `WaterLow`     | remote water level | `< low_water`      |
//! | `TempHigh`     | temperature        | `> high_temp_c`    |
//! | `HumidityHigh` | humidity           | `> high_humidity`  |
//! | `Vibration`    | vibration flag     | `true`             |
//!
//! There is no hysteresis band. A value oscillating around a threshold raises
//! once per upward crossing.
//!
//! ## Evaluation Points
//!
//! Alerts are evaluated where their input changes, not on a timer:
//! water level when a frame is ingested, climate when the environment task
//! commits a valid sample, vibration when the debounced flag changes.

use core::fmt::Write;

use crate::constants::buffers::MAX_TRANSITIONS;
use crate::constants::thresholds::{
    HIGH_HUMIDITY_THRESHOLD_PCT, HIGH_TEMP_THRESHOLD_C, LOW_WATER_THRESHOLD,
};
use crate::events::{AlertEvent, AlertKind, AlertMessage};
use crate::state::{EnvironmentSample, RemoteSensorSample};

/// Transitions produced by one evaluation
pub type Transitions = heapless::Vec<AlertTransition, MAX_TRANSITIONS>;

/// Fixed alert trip points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlertThresholds {
    /// Water level below this is low
    pub low_water: i32,
    /// Temperature above this is high (°C)
    pub high_temp_c: f32,
    /// Humidity above this is high (%)
    pub high_humidity_pct: f32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            low_water: LOW_WATER_THRESHOLD,
            high_temp_c: HIGH_TEMP_THRESHOLD_C,
            high_humidity_pct: HIGH_HUMIDITY_THRESHOLD_PCT,
        }
    }
}

/// Change in an alert's state
#[derive(Debug, Clone, PartialEq)]
pub enum AlertTransition {
    /// Condition became true; notify once
    Raised(AlertEvent),
    /// Condition became false; reset indicators
    Cleared(AlertKind),
}

impl AlertTransition {
    /// Kind this transition belongs to
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertTransition::Raised(event) => event.kind,
            AlertTransition::Cleared(kind) => *kind,
        }
    }
}

/// Level-to-edge latch for one alert kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    active: bool,
}

/// Edge reported by [`AlertState::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Inactive → active
    Rising,
    /// Active → inactive
    Falling,
    /// No change
    Steady,
}

impl AlertState {
    /// Whether the alert is currently active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed the current condition and get the edge
    pub fn update(&mut self, condition: bool) -> Edge {
        let edge = match (self.active, condition) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::Steady,
        };
        self.active = condition;
        edge
    }
}

/// Threshold evaluator holding one latch per alert kind
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    states: [AlertState; 4],
}

impl AlertEvaluator {
    /// Evaluator with the given thresholds, all alerts inactive
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            states: [AlertState::default(); 4],
        }
    }

    /// Thresholds in use
    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Current latch for a kind
    pub fn state(&self, kind: AlertKind) -> AlertState {
        self.states[kind.index()]
    }

    /// Evaluate the water-low alert against a freshly ingested remote sample
    pub fn evaluate_remote(&mut self, sample: &RemoteSensorSample) -> Option<AlertTransition> {
        let level = sample.water_level;
        self.step(AlertKind::WaterLow, level < self.thresholds.low_water, Reading::Level(level))
    }

    /// Evaluate the temperature and humidity alerts against a committed sample
    pub fn evaluate_environment(&mut self, sample: &EnvironmentSample) -> Transitions {
        let mut out = Transitions::new();
        let checks = [
            (AlertKind::TempHigh, sample.temperature_c > self.thresholds.high_temp_c, sample.temperature_c),
            (AlertKind::HumidityHigh, sample.humidity_pct > self.thresholds.high_humidity_pct, sample.humidity_pct),
        ];
        for (kind, condition, value) in checks {
            if let Some(transition) = self.step(kind, condition, Reading::Scalar(value)) {
                // At most two here; capacity is one per kind.
                let _ = out.push(transition);
            }
        }
        out
    }

    /// Evaluate the vibration alert against the debounced flag
    pub fn evaluate_vibration(&mut self, detected: bool) -> Option<AlertTransition> {
        self.step(AlertKind::Vibration, detected, Reading::Scalar(if detected { 1.0 } else { 0.0 }))
    }

    fn step(&mut self, kind: AlertKind, condition: bool, reading: Reading) -> Option<AlertTransition> {
        match self.states[kind.index()].update(condition) {
            Edge::Rising => {
                let event = AlertEvent {
                    kind,
                    value: reading.as_f32(),
                    message: format_message(kind, reading),
                };
                log_info!("{} raised: {}", kind, event.message.as_str());
                Some(AlertTransition::Raised(event))
            }
            Edge::Falling => {
                log_debug!("{} cleared", kind);
                Some(AlertTransition::Cleared(kind))
            }
            Edge::Steady => None,
        }
    }
}

/// Value that tripped an alert, kept in its source type for formatting
#[derive(Debug, Clone, Copy)]
enum Reading {
    Level(i32),
    Scalar(f32),
}

impl Reading {
    fn as_f32(self) -> f32 {
        match self {
            Reading::Level(level) => level as f32,
            Reading::Scalar(value) => value,
        }
    }
}

fn format_message(kind: AlertKind, reading: Reading) -> AlertMessage {
    let mut message = AlertMessage::new();
    // Longest message is well under ALERT_MESSAGE_LEN; a truncated message is
    // still better than no alert.
    let _ = match (kind, reading) {
        (AlertKind::Vibration, _) => message.write_str("Warning: System Vibration Detected!"),
        (_, Reading::Level(level)) => write!(message, "Water level low: {}", level),
        (AlertKind::TempHigh, Reading::Scalar(value)) => write!(message, "High Temp: {:.1}°C", value),
        (AlertKind::HumidityHigh, Reading::Scalar(value)) => {
            write!(message, "High Humidity: {:.1}%", value)
        }
        (AlertKind::WaterLow, Reading::Scalar(value)) => {
            write!(message, "Water level low: {}", value as i32)
        }
    };
    message
}
