//! Shared doubles for the integration tests
//!
//! Every collaborator trait gets a recording mock so tests can assert on
//! exactly what the gateway or node pushed out.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use relaygate_core::{
    events::{AlertKind, VirtualChannel},
    link::{PeerAddress, PeerRegistration},
    packet::{PacketLayout, SensorPacket},
    state::{Distance, TelemetrySnapshot},
    traits::{Actuator, Angle, DashboardSink, GatewaySensors, NodeSensors, PeerLink, TelemetryUplink},
};

pub const NODE_ADDRESS: PeerAddress = PeerAddress::new([0x24, 0x6F, 0x28, 0x01, 0x02, 0x03]);

/// Climate readings are served from a script; the last one repeats
#[derive(Debug, Default)]
pub struct ScriptedSensors {
    pub climate: VecDeque<(f32, f32)>,
    pub last_climate: (f32, f32),
    pub vibration: bool,
    pub climate_reads: u32,
}

impl ScriptedSensors {
    pub fn steady(temperature_c: f32, humidity_pct: f32) -> Self {
        Self { last_climate: (temperature_c, humidity_pct), ..Default::default() }
    }

    pub fn script(readings: &[(f32, f32)]) -> Self {
        let mut sensors = Self::default();
        sensors.climate.extend(readings.iter().copied());
        sensors
    }
}

impl GatewaySensors for ScriptedSensors {
    fn read_temperature_humidity(&mut self) -> (f32, f32) {
        self.climate_reads += 1;
        if let Some(reading) = self.climate.pop_front() {
            self.last_climate = reading;
        }
        self.last_climate
    }

    fn read_vibration(&mut self) -> bool {
        self.vibration
    }
}

#[derive(Debug, Default)]
pub struct MockServo {
    pub position: Angle,
    pub moves: Vec<Angle>,
}

impl Actuator for MockServo {
    fn set_position(&mut self, angle: Angle) {
        self.position = angle;
        self.moves.push(angle);
    }

    fn position(&self) -> Angle {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCall {
    Alert(AlertKind, String),
    Metric(VirtualChannel, f32),
}

#[derive(Debug, Default)]
pub struct RecordingDashboard {
    pub calls: Vec<DashboardCall>,
}

impl RecordingDashboard {
    pub fn alerts(&self) -> Vec<(AlertKind, String)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DashboardCall::Alert(kind, message) => Some((*kind, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn metrics(&self, channel: VirtualChannel) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DashboardCall::Metric(c, value) if *c == channel => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DashboardSink for RecordingDashboard {
    fn publish_alert(&mut self, kind: AlertKind, message: &str) {
        self.calls.push(DashboardCall::Alert(kind, message.to_string()));
    }

    fn publish_metric(&mut self, channel: VirtualChannel, value: f32) {
        self.calls.push(DashboardCall::Metric(channel, value));
    }
}

#[derive(Debug, Default)]
pub struct RecordingUplink {
    pub snapshots: Vec<TelemetrySnapshot>,
    pub fail: bool,
}

impl TelemetryUplink for RecordingUplink {
    type Error = &'static str;

    fn push_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), Self::Error> {
        if self.fail {
            return Err("network unreachable");
        }
        self.snapshots.push(*snapshot);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FixedProbes {
    pub water_level: i32,
    pub distance: Distance,
}

impl NodeSensors for FixedProbes {
    fn read_water_level(&mut self) -> i32 {
        self.water_level
    }

    fn read_distance(&mut self) -> Distance {
        self.distance
    }
}

/// Radio log shared between the node under test and the assertions
#[derive(Debug, Default)]
pub struct RadioLog {
    pub registrations: Vec<PeerRegistration>,
    pub frames: Vec<(PeerAddress, Vec<u8>)>,
}

#[derive(Debug, Default, Clone)]
pub struct MockRadio {
    pub log: Rc<RefCell<RadioLog>>,
    pub refuse_peers: bool,
}

impl PeerLink for MockRadio {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn add_peer(&mut self, peer: &PeerRegistration) -> Result<(), Self::Error> {
        if self.refuse_peers {
            return Err("peer table full");
        }
        self.log.borrow_mut().registrations.push(*peer);
        Ok(())
    }

    fn send(&mut self, address: PeerAddress, payload: &[u8]) -> nb::Result<(), Self::Error> {
        self.log.borrow_mut().frames.push((address, payload.to_vec()));
        Ok(())
    }
}

pub fn encode(water_level: i32, distance_cm: f32, layout: PacketLayout) -> Vec<u8> {
    SensorPacket::new(water_level, Distance::Centimeters(distance_cm))
        .encode(layout)
        .expect("encodable sample")
        .to_vec()
}
