//! Latest-Known Sensor State
//!
//! ## Overview
//!
//! The gateway keeps exactly one cached value per input: the last remote
//! sample decoded from a node, the last valid local climate sample, and the
//! debounced vibration flag. Evaluators and publishers read from here; nothing
//! else holds sensor state.
//!
//! ## Ownership
//!
//! There is one [`SensorStateStore`] per process, created at startup and
//! passed by reference into each component. Each field has a single writer:
//!
//! ```text
//! remote       ← main loop, draining the inbound frame queue
//! environment  ← environment task
//! vibration    ← vibration task
//! ```
//!
//! The radio receive callback never touches the store; it only enqueues raw
//! frames (see [`queue`](crate::queue)), so there is no torn-read hazard.
//!
//! ## Staleness
//!
//! If a node goes silent the remote sample simply stays at its last value.
//! No timestamp or staleness flag is kept.

use core::fmt;

use crate::errors::{GatewayError, GatewayResult};
use crate::constants::sensors::NO_ECHO_WIRE_VALUE;

/// Ultrasonic distance reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distance {
    /// Echo received; distance in centimetres
    Centimeters(f32),
    /// Echo timed out
    NoEcho,
}

impl Distance {
    /// Interpret a wire value; any negative distance means no echo
    pub fn from_wire(value: f32) -> Self {
        if value < 0.0 {
            Distance::NoEcho
        } else {
            Distance::Centimeters(value)
        }
    }

    /// Value to put on the wire or a dashboard channel
    pub fn to_wire(self) -> f32 {
        match self {
            Distance::Centimeters(cm) => cm,
            Distance::NoEcho => NO_ECHO_WIRE_VALUE,
        }
    }

    /// Distance in centimetres, if an echo was received
    pub fn centimeters(self) -> Option<f32> {
        match self {
            Distance::Centimeters(cm) => Some(cm),
            Distance::NoEcho => None,
        }
    }
}

impl Default for Distance {
    fn default() -> Self {
        Distance::Centimeters(0.0)
    }
}

/// Sample pushed by a remote sensor node
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteSensorSample {
    /// Raw water-level reading (sensor ADC scale, 0-4095 on current nodes)
    pub water_level: i32,
    /// Ultrasonic distance
    pub distance: Distance,
}

/// Local climate sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvironmentSample {
    /// Air temperature in °C
    pub temperature_c: f32,
    /// Relative humidity in %
    pub humidity_pct: f32,
}

impl EnvironmentSample {
    /// Build a sample, rejecting NaN in either field
    pub fn new(temperature_c: f32, humidity_pct: f32) -> GatewayResult<Self> {
        if temperature_c.is_nan() {
            return Err(GatewayError::InvalidReading { reason: "temperature is NaN" });
        }
        if humidity_pct.is_nan() {
            return Err(GatewayError::InvalidReading { reason: "humidity is NaN" });
        }
        Ok(Self { temperature_c, humidity_pct })
    }
}

/// Values forwarded in the periodic HTTP snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TelemetrySnapshot {
    /// Last valid temperature (°C)
    pub temp: f32,
    /// Last valid humidity (%)
    pub humid: f32,
    /// Last remote water level
    pub water: i32,
    /// Last remote distance in cm, -1.0 when there was no echo
    pub distance: f32,
    /// Current vibration flag
    pub vibration: bool,
}

impl TelemetrySnapshot {
    /// Write the snapshot as URL query parameters
    ///
    /// Produces `temp=25.00&humid=60.00&water=420&distance=123.45&vibration=0`.
    pub fn write_query<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "temp={:.2}&humid={:.2}&water={}&distance={:.2}&vibration={}",
            self.temp,
            self.humid,
            self.water,
            self.distance,
            u8::from(self.vibration),
        )
    }
}

/// Process-wide latest-value cache
#[derive(Debug, Clone, Default)]
pub struct SensorStateStore {
    remote: RemoteSensorSample,
    environment: EnvironmentSample,
    vibration: bool,
}

impl SensorStateStore {
    /// Empty store: zero samples, no vibration
    pub fn new() -> Self {
        Self::default()
    }

    /// Last remote sample
    pub fn remote(&self) -> &RemoteSensorSample {
        &self.remote
    }

    /// Last valid environment sample
    pub fn environment(&self) -> &EnvironmentSample {
        &self.environment
    }

    /// Current vibration flag
    pub fn vibration(&self) -> bool {
        self.vibration
    }

    /// Replace the remote sample wholesale
    pub fn apply_remote(&mut self, sample: RemoteSensorSample) {
        self.remote = sample;
    }

    /// Commit a climate reading if both values are valid
    ///
    /// On error the previous sample is kept untouched.
    pub fn commit_environment(
        &mut self,
        temperature_c: f32,
        humidity_pct: f32,
    ) -> GatewayResult<EnvironmentSample> {
        let sample = EnvironmentSample::new(temperature_c, humidity_pct)?;
        self.environment = sample;
        Ok(sample)
    }

    /// Record a vibration poll
    ///
    /// Returns the new state only when it differs from the cached one.
    pub fn update_vibration(&mut self, detected: bool) -> Option<bool> {
        if detected == self.vibration {
            return None;
        }
        self.vibration = detected;
        Some(detected)
    }

    /// Values for the outbound snapshot
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            temp: self.environment.temperature_c,
            humid: self.environment.humidity_pct,
            water: self.remote.water_level,
            distance: self.remote.distance.to_wire(),
            vibration: self.vibration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_environment_keeps_previous() {
        let mut store = SensorStateStore::new();
        store.commit_environment(22.5, 40.0).unwrap();

        let result = store.commit_environment(30.0, f32::NAN);
        assert!(matches!(result, Err(GatewayError::InvalidReading { .. })));
        assert_eq!(store.environment().temperature_c, 22.5);
        assert_eq!(store.environment().humidity_pct, 40.0);

        assert!(store.commit_environment(f32::NAN, 50.0).is_err());
        assert_eq!(store.environment().humidity_pct, 40.0);
    }

    #[test]
    fn vibration_reports_only_changes() {
        let mut store = SensorStateStore::new();
        assert_eq!(store.update_vibration(false), None);
        assert_eq!(store.update_vibration(true), Some(true));
        assert_eq!(store.update_vibration(true), None);
        assert_eq!(store.update_vibration(false), Some(false));
        assert!(!store.vibration());
    }

    #[test]
    fn remote_sample_replaced_wholesale() {
        let mut store = SensorStateStore::new();
        store.apply_remote(RemoteSensorSample {
            water_level: 1200,
            distance: Distance::Centimeters(50.0),
        });
        store.apply_remote(RemoteSensorSample {
            water_level: 300,
            distance: Distance::NoEcho,
        });
        assert_eq!(store.remote().water_level, 300);
        assert_eq!(store.remote().distance, Distance::NoEcho);
    }

    #[test]
    fn negative_wire_distance_is_no_echo() {
        assert_eq!(Distance::from_wire(-1.0), Distance::NoEcho);
        assert_eq!(Distance::from_wire(0.0), Distance::Centimeters(0.0));
        assert_eq!(Distance::NoEcho.to_wire(), -1.0);
    }

    #[test]
    fn snapshot_query_format() {
        let mut store = SensorStateStore::new();
        store.commit_environment(25.0, 61.5).unwrap();
        store.apply_remote(RemoteSensorSample {
            water_level: 420,
            distance: Distance::Centimeters(123.45),
        });
        store.update_vibration(true);

        let mut query = heapless::String::<128>::new();
        store.snapshot().write_query(&mut query).unwrap();
        assert_eq!(
            query.as_str(),
            "temp=25.00&humid=61.50&water=420&distance=123.45&vibration=1"
        );
    }
}
