//! Dashboard Event Types
//!
//! ## Overview
//!
//! The gateway talks to the dashboard in two ways:
//!
//! - **Alerts**: one-off notifications with a human-readable message, raised
//!   when a threshold is crossed ([`AlertEvent`])
//! - **Metrics**: latest values written to numbered virtual channels
//!   ([`VirtualChannel`])
//!
//! The dashboard also writes back on the actuator trigger channel; that is the
//! only inbound command the gateway accepts.
//!
//! ## Memory Model
//!
//! Alert messages are formatted into a fixed-capacity `heapless::String`, so an
//! event is a plain value that can sit on the stack or in a `heapless::Vec`.
//!
//! ```text
//! AlertEvent
//! ├── kind:    1 byte
//! ├── value:   4 bytes
//! └── message: 64 bytes + length
//! ```

use core::fmt;

use crate::constants::buffers::ALERT_MESSAGE_LEN;

/// Fixed-capacity alert message
pub type AlertMessage = heapless::String<ALERT_MESSAGE_LEN>;

/// Alert kinds the gateway raises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum AlertKind {
    /// Remote water level below threshold
    WaterLow = 0,
    /// Local temperature above threshold
    TempHigh = 1,
    /// Local humidity above threshold
    HumidityHigh = 2,
    /// Vibration switch closed
    Vibration = 3,
}

impl AlertKind {
    /// Every kind, in evaluation order
    pub const ALL: [AlertKind; 4] = [
        AlertKind::WaterLow,
        AlertKind::TempHigh,
        AlertKind::HumidityHigh,
        AlertKind::Vibration,
    ];

    /// Event name used by the dashboard
    pub const fn name(&self) -> &'static str {
        match self {
            AlertKind::WaterLow => "water_alert",
            AlertKind::TempHigh => "temp_alert",
            AlertKind::HumidityHigh => "humidity_alert",
            AlertKind::Vibration => "vibration_alert",
        }
    }

    /// Slot index for per-kind state tables
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Dashboard channel that mirrors this alert, if any
    ///
    /// Set to 1 when the alert is raised and back to 0 when it clears.
    pub const fn indicator(&self) -> Option<VirtualChannel> {
        match self {
            AlertKind::Vibration => Some(VirtualChannel::Vibration),
            _ => None,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raised alert
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    /// Which threshold was crossed
    pub kind: AlertKind,
    /// Reading that crossed it
    pub value: f32,
    /// Message for the dashboard
    pub message: AlertMessage,
}

/// Numbered dashboard metric channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum VirtualChannel {
    /// Remote water level
    WaterLevel = 1,
    /// Local temperature (°C)
    Temperature = 2,
    /// Local humidity (%)
    Humidity = 3,
    /// Actuator trigger button; reset to 0 when a motion completes
    ActuatorTrigger = 4,
    /// Remote distance (cm, -1 for no echo)
    Distance = 5,
    /// Vibration indicator
    Vibration = 6,
}

impl VirtualChannel {
    /// Channel number on the dashboard
    pub const fn number(&self) -> u8 {
        *self as u8
    }

    /// Channel for a dashboard channel number
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(VirtualChannel::WaterLevel),
            2 => Some(VirtualChannel::Temperature),
            3 => Some(VirtualChannel::Humidity),
            4 => Some(VirtualChannel::ActuatorTrigger),
            5 => Some(VirtualChannel::Distance),
            6 => Some(VirtualChannel::Vibration),
            _ => None,
        }
    }
}

impl fmt::Display for VirtualChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}
