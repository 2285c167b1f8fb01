//! Gateway ingestion and control core for RelayGate
//!
//! Battery-class sensor nodes push water-level and distance readings over a
//! peer-to-peer radio link. The gateway decodes them, merges them with its own
//! climate and vibration sensors, raises threshold alerts, drives a single
//! positional actuator and forwards periodic snapshots to a dashboard.
//!
//! Key constraints:
//! - Runs on a single-core microcontroller with one control loop
//! - No heap allocation anywhere in the core
//! - Radio callbacks may interrupt the loop between any two instructions
//!
//! ```no_run
//! use relaygate_core::packet::decode;
//!
//! // 8-byte frame: i32 water level followed by f32 distance
//! let mut frame = [0u8; 8];
//! frame[..4].copy_from_slice(&420i32.to_le_bytes());
//! frame[4..].copy_from_slice(&123.45f32.to_le_bytes());
//!
//! match decode(&frame) {
//!     Ok(packet) => {}, // packet.sample.water_level == 420
//!     Err(e) => {},     // unknown layout, drop it
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod actuator;
pub mod alerts;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod link;
pub mod node;
pub mod packet;
pub mod queue;
pub mod scheduler;
pub mod state;
pub mod time;
pub mod traits;

// Public API
pub use actuator::{ActuatorController, ActuatorMotion, MotionComplete};
pub use alerts::{AlertEvaluator, AlertThresholds, AlertTransition};
pub use config::{GatewayConfig, NodeConfig};
pub use errors::{GatewayError, GatewayResult};
pub use events::{AlertEvent, AlertKind, VirtualChannel};
pub use gateway::Gateway;
pub use link::{ChannelPolicy, LinkRecovery, PeerAddress, PeerLinkState};
pub use node::SensorNode;
pub use packet::{decode, DecodedPacket, PacketLayout, SensorPacket};
pub use queue::{FrameQueue, InboundFrame};
pub use scheduler::Scheduler;
pub use state::{Distance, EnvironmentSample, RemoteSensorSample, SensorStateStore};
pub use time::Timestamp;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
