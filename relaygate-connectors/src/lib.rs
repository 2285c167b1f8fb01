//! Dashboard and Uplink Connectors for the RelayGate Gateway
//!
//! ## Overview
//!
//! The gateway core talks to the outside world through two traits,
//! [`DashboardSink`](relaygate_core::traits::DashboardSink) and
//! [`TelemetryUplink`](relaygate_core::traits::TelemetryUplink). This crate
//! provides networked implementations of both for gateways that run on a
//! hosted OS (a Raspberry Pi class board, or a desktop during bring-up).
//!
//! | Connector                        | Trait             | Transport |
//! |----------------------------------|-------------------|-----------|
//! | [`mqtt::MqttDashboard`]          | `DashboardSink`   | MQTT      |
//! | [`http::SnapshotUplink`]         | `TelemetryUplink` | HTTP GET  |
//!
//! ### MQTT Dashboard
//!
//! **Topic layout** under a configurable prefix:
//! ```text
//! {prefix}/v1 .. {prefix}/v6      metric channels, plain-text value
//! {prefix}/alerts/{event}         alert, JSON {"event": ..., "message": ...}
//! {prefix}/v4/set                 actuator trigger written by the dashboard
//! ```
//!
//! Publishing never blocks the control loop: messages go into the client's
//! request queue and a background thread drives the connection. A full queue
//! drops the message and counts it.
//!
//! ### HTTP Snapshot Uplink
//!
//! Each snapshot becomes one GET request with the readings in the query
//! string. Redirects are followed, the response body is ignored, and there
//! are no retries; the next snapshot is a minute away anyway.
//!
//! ## Example Usage
//!
//! ```no_run
//! use relaygate_connectors::http::{HttpConfig, SnapshotUplink};
//! use relaygate_connectors::mqtt::{MqttConfig, MqttDashboard};
//!
//! let uplink = SnapshotUplink::new(
//!     HttpConfig::new("https://script.example.com/macros/s/deployment/exec").timeout_secs(10),
//! )?;
//!
//! let dashboard = MqttDashboard::connect(
//!     MqttConfig::new("broker.local", 1883).client_id("gateway-01").topic_prefix("farm/tank"),
//! )?;
//!
//! // In the main loop
//! if let Some(value) = dashboard.poll_trigger() {
//!     // gateway.on_remote_trigger(value, now);
//! }
//! # Ok::<(), relaygate_connectors::ConnectorError>(())
//! ```

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "http")]
pub mod http;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttDashboard};

#[cfg(feature = "http")]
pub use http::{HttpConfig, SnapshotUplink};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Request queue full; message dropped
    #[error("Request queue full")]
    QueueFull,

    /// Network-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server answered with an error status
    #[error("Server returned status {0}")]
    Status(u16),

    /// Protocol-level failure
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Invalid connector configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Number of reconnections
    pub reconnections: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    /// Record a successful send
    pub fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Record a failed send
    pub fn record_failure(&mut self, error: &ConnectorError) {
        self.messages_failed += 1;
        self.last_error = Some(error.to_string());
    }
}
