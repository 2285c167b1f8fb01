//! Constants for RelayGate Core
//!
//! Every threshold, period and wire-level number used by the gateway and the
//! sensor nodes lives here, with the reason it has the value it has.
//!
//! ## Organization
//!
//! - **Thresholds**: alert trip points and actuator angles
//! - **Time**: task periods and motion timings
//! - **Link**: radio channel, frame and queue limits
//! - **Sensors**: unit conversions for the node-side probes
//!
//! These are the defaults behind [`GatewayConfig`](crate::config::GatewayConfig)
//! and [`NodeConfig`](crate::config::NodeConfig); deployments override them
//! through configuration rather than by editing this module.

/// Alert thresholds and actuator positions.
pub mod thresholds;

/// Task periods and motion timings.
pub mod time;

/// Radio channel, peer and frame limits.
pub mod link;

/// Buffer and table capacities.
pub mod buffers;

/// Node-side sensor conversions.
pub mod sensors;

pub use thresholds::{
    LOW_WATER_THRESHOLD, HIGH_TEMP_THRESHOLD_C, HIGH_HUMIDITY_THRESHOLD_PCT,
    ACTUATOR_REST_ANGLE, ACTUATOR_TRIGGER_ANGLE,
};

pub use time::{
    ENVIRONMENT_PERIOD_MS, VIBRATION_PERIOD_MS, SNAPSHOT_PERIOD_MS, NODE_SEND_PERIOD_MS,
    ACTUATOR_HOLD_MS, RAMP_DURATION_MS, RAMP_STEPS,
};

pub use link::{FIXED_CHANNEL, FOLLOW_STATION_CHANNEL, MAX_FRAME_LEN};

pub use buffers::{FRAME_QUEUE_CAPACITY, MAX_GATEWAY_TASKS, ALERT_MESSAGE_LEN};
