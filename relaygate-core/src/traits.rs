//! Collaborator interfaces
//!
//! The core does no I/O of its own. Radio, pins, servo, dashboard and HTTP
//! client are all reached through these traits, which board support code
//! implements and tests mock. Keep them small - a board crate should be able
//! to implement each in a handful of lines.

use crate::events::{AlertKind, VirtualChannel};
use crate::link::{PeerAddress, PeerRegistration};
use crate::state::{Distance, TelemetrySnapshot};

pub use crate::time::{Delay, TimeSource};

/// Servo angle or actuator level
pub type Angle = i32;

/// Peer-to-peer radio link
///
/// Send results and received frames arrive through callbacks owned by the
/// board code; it forwards them to
/// [`SensorNode::on_send_result`](crate::node::SensorNode::on_send_result) and
/// [`FrameProducer::on_receive`](crate::queue::FrameProducer::on_receive).
pub trait PeerLink {
    /// Link-layer error
    type Error: core::fmt::Debug;

    /// Bring the link layer up; failure here is fatal
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Register (or re-register) a peer; must not block
    fn add_peer(&mut self, peer: &PeerRegistration) -> Result<(), Self::Error>;

    /// Queue a frame for transmission
    ///
    /// `WouldBlock` means the radio is busy; delivery is reported later
    /// through the send-result callback.
    fn send(&mut self, address: PeerAddress, payload: &[u8]) -> nb::Result<(), Self::Error>;
}

/// Climate and vibration sensors wired to the gateway
pub trait GatewaySensors {
    /// Temperature (°C) and humidity (%); either may be NaN on a failed read
    fn read_temperature_humidity(&mut self) -> (f32, f32);

    /// Vibration switch state
    fn read_vibration(&mut self) -> bool;
}

/// Level and range sensors wired to a node
pub trait NodeSensors {
    /// Raw water-level reading
    fn read_water_level(&mut self) -> i32;

    /// Ultrasonic distance, or no echo
    fn read_distance(&mut self) -> Distance;
}

/// Single positional actuator
pub trait Actuator {
    /// Move to an absolute position
    fn set_position(&mut self, angle: Angle);

    /// Last commanded position
    fn position(&self) -> Angle;
}

/// Dashboard client
///
/// Both calls are fire-and-forget; implementations absorb their own errors.
pub trait DashboardSink {
    /// Raise a named alert
    fn publish_alert(&mut self, kind: AlertKind, message: &str);

    /// Write a value to a metric channel
    fn publish_metric(&mut self, channel: VirtualChannel, value: f32);
}

/// Outbound snapshot delivery
///
/// May block on network I/O, so it is only ever called from a scheduler task.
pub trait TelemetryUplink {
    /// Delivery error; logged and dropped by the gateway
    type Error: core::fmt::Debug;

    /// Send one snapshot
    fn push_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), Self::Error>;
}

impl<T: DashboardSink + ?Sized> DashboardSink for &mut T {
    fn publish_alert(&mut self, kind: AlertKind, message: &str) {
        (**self).publish_alert(kind, message)
    }

    fn publish_metric(&mut self, channel: VirtualChannel, value: f32) {
        (**self).publish_metric(channel, value)
    }
}
