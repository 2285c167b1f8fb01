//! Gateway and Node Configuration
//!
//! Every field defaults to the value in [`constants`](crate::constants), so an
//! empty JSON object is a complete configuration:
//!
//! ```rust
//! # #[cfg(feature = "json")] {
//! use relaygate_core::config::GatewayConfig;
//!
//! let config = GatewayConfig::from_json_str(r#"{ "schedule": { "snapshot_ms": 30000 } }"#).unwrap();
//! assert_eq!(config.schedule.snapshot_ms, 30_000);
//! assert_eq!(config.schedule.environment_ms, 2000);
//! # }
//! ```
//!
//! Configuration is read once at startup and validated before any component
//! is built from it.

use crate::actuator::ActuatorSettings;
use crate::alerts::AlertThresholds;
use crate::constants::link::{FIXED_CHANNEL, MAX_CHANNEL};
use crate::constants::time::{
    ENVIRONMENT_PERIOD_MS, NODE_SEND_PERIOD_MS, SNAPSHOT_PERIOD_MS, VIBRATION_PERIOD_MS,
};
use crate::errors::{GatewayError, GatewayResult};
use crate::link::{ChannelPolicy, PeerAddress, PeerLinkState};
use crate::packet::PacketLayout;

/// Address of the gateway in the reference deployment
pub const DEFAULT_GATEWAY_ADDRESS: PeerAddress =
    PeerAddress::new([0x28, 0x56, 0x2F, 0x49, 0x9C, 0x88]);

/// Gateway task periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulePeriods {
    /// Climate read and publish (ms)
    pub environment_ms: u32,
    /// Vibration poll (ms)
    pub vibration_ms: u32,
    /// Outbound snapshot (ms)
    pub snapshot_ms: u32,
}

impl Default for SchedulePeriods {
    fn default() -> Self {
        Self {
            environment_ms: ENVIRONMENT_PERIOD_MS,
            vibration_ms: VIBRATION_PERIOD_MS,
            snapshot_ms: SNAPSHOT_PERIOD_MS,
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GatewayConfig {
    /// Alert trip points
    pub thresholds: AlertThresholds,
    /// Task periods
    pub schedule: SchedulePeriods,
    /// Actuator motion
    pub actuator: ActuatorSettings,
}

impl GatewayConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> GatewayResult<()> {
        let schedule = &self.schedule;
        if schedule.environment_ms == 0 || schedule.vibration_ms == 0 || schedule.snapshot_ms == 0 {
            return Err(GatewayError::InvalidConfig { reason: "task periods must be non-zero" });
        }
        if self.actuator.ramp_steps == 0 {
            return Err(GatewayError::InvalidConfig { reason: "ramp_steps must be non-zero" });
        }
        let thresholds = &self.thresholds;
        if thresholds.high_temp_c.is_nan() || thresholds.high_humidity_pct.is_nan() {
            return Err(GatewayError::InvalidConfig { reason: "thresholds must be numbers" });
        }
        Ok(())
    }

    /// Parse and validate JSON configuration
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> GatewayResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_e| {
            log_error!("gateway config rejected: {}", _e);
            GatewayError::InvalidConfig { reason: "malformed JSON" }
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Sensor node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeConfig {
    /// Gateway peer and channel policy
    pub link: PeerLinkState,
    /// Transmit period (ms)
    pub send_period_ms: u32,
    /// Payload layout to transmit
    pub wire_layout: PacketLayout,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            link: PeerLinkState {
                peer_address: DEFAULT_GATEWAY_ADDRESS,
                channel_policy: ChannelPolicy::Fixed(FIXED_CHANNEL),
            },
            send_period_ms: NODE_SEND_PERIOD_MS,
            wire_layout: PacketLayout::default(),
        }
    }
}

impl NodeConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> GatewayResult<()> {
        if self.send_period_ms == 0 {
            return Err(GatewayError::InvalidConfig { reason: "send_period_ms must be non-zero" });
        }
        if let ChannelPolicy::Fixed(channel) = self.link.channel_policy {
            if channel == 0 || channel > MAX_CHANNEL {
                return Err(GatewayError::InvalidConfig { reason: "fixed channel must be 1-14" });
            }
        }
        Ok(())
    }

    /// Parse and validate JSON configuration
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> GatewayResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_e| {
            log_error!("node config rejected: {}", _e);
            GatewayError::InvalidConfig { reason: "malformed JSON" }
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
        assert!(NodeConfig::default().validate().is_ok());

        let node = NodeConfig::default();
        assert_eq!(node.link.registration().channel, 6);
        assert_eq!(node.send_period_ms, 1000);
        assert_eq!(node.wire_layout, PacketLayout::Int32Float);
    }

    #[test]
    fn zero_period_rejected() {
        let mut config = GatewayConfig::default();
        config.schedule.vibration_ms = 0;
        assert!(matches!(config.validate(), Err(GatewayError::InvalidConfig { .. })));

        let node = NodeConfig { send_period_ms: 0, ..NodeConfig::default() };
        assert!(node.validate().is_err());
    }

    #[test]
    fn channel_range_checked() {
        let mut node = NodeConfig::default();
        node.link.channel_policy = ChannelPolicy::Fixed(15);
        assert!(node.validate().is_err());
        node.link.channel_policy = ChannelPolicy::FollowStation;
        assert!(node.validate().is_ok());
    }

    #[cfg(feature = "json")]
    #[test]
    fn partial_json_fills_defaults() {
        let config = GatewayConfig::from_json_str(
            r#"{ "thresholds": { "high_temp_c": 40.0 }, "actuator": { "hold_ms": 1500 } }"#,
        )
        .unwrap();
        assert_eq!(config.thresholds.high_temp_c, 40.0);
        assert_eq!(config.thresholds.low_water, 500);
        assert_eq!(config.actuator.hold_ms, 1500);
        assert_eq!(config.actuator.trigger_angle, 30);

        let node = NodeConfig::from_json_str(
            r#"{ "link": { "peer_address": [1,2,3,4,5,6], "channel_policy": "follow_station" },
                 "wire_layout": "uint16_float" }"#,
        )
        .unwrap();
        assert_eq!(node.link.channel_policy, ChannelPolicy::FollowStation);
        assert_eq!(node.wire_layout, PacketLayout::Uint16Float);
    }

    #[cfg(feature = "json")]
    #[test]
    fn malformed_json_rejected() {
        assert_eq!(
            GatewayConfig::from_json_str("{ not json"),
            Err(GatewayError::InvalidConfig { reason: "malformed JSON" })
        );
        assert!(GatewayConfig::from_json_str(r#"{ "schedule": { "snapshot_ms": 0 } }"#).is_err());
    }
}
