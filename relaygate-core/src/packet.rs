//! Sensor Payload Wire Formats
//!
//! ## Overview
//!
//! Sensor nodes send one fixed payload: a water level and a distance. Over
//! several firmware revisions that payload has been laid out three different
//! ways, and none of them carries a header, version tag or checksum. The frame
//! length is the only thing the gateway can go on.
//!
//! ## Layouts
//!
//! ```text
//! Int32Float     (8 bytes)  ┌───────── i32 water ─────────┬───────── f32 distance ──────┐
//!                           │  0     1     2     3        │  4     5     6     7        │
//!
//! Uint16Float    (6 bytes)  ┌─ u16 water ─┬───────── f32 distance ──────┐
//!                           │  0     1    │  2     3     4     5        │
//!
//! FloatInt32     (>= 8)     ┌───────── f32 distance ──────┬───────── i32 water ─────────┬ ignored ...
//!                           │  0     1     2     3        │  4     5     6     7        │
//! ```
//!
//! All fields are little-endian, which is what every node MCU produces when it
//! copies its in-memory struct onto the radio.
//!
//! ## Resolution Order
//!
//! Rules are tried in this order and the first match wins:
//!
//! 1. exactly 8 bytes → `Int32Float`
//! 2. exactly 6 bytes → `Uint16Float`
//! 3. 8 bytes or more → `FloatInt32`
//! 4. anything else → [`GatewayError::UnrecognizedPacket`]
//!
//! The order is load-bearing. An 8-byte frame also satisfies rule 3, and the
//! bytes alone cannot tell the two apart; which one a given node meant is a
//! deployment convention. Rule 1 always takes priority and rule 3 only ever
//! sees frames longer than 8 bytes.

use crate::errors::{GatewayError, GatewayResult};
use crate::state::{Distance, RemoteSensorSample};

/// Length of the `Int32Float` layout
pub const INT32_FLOAT_LEN: usize = core::mem::size_of::<i32>() + core::mem::size_of::<f32>();

/// Length of the `Uint16Float` layout
pub const UINT16_FLOAT_LEN: usize = core::mem::size_of::<u16>() + core::mem::size_of::<f32>();

/// Minimum length of the reordered `FloatInt32` layout
pub const FLOAT_INT32_MIN_LEN: usize = core::mem::size_of::<f32>() + core::mem::size_of::<i32>();

/// Longest encoded payload
pub const MAX_ENCODED_LEN: usize = INT32_FLOAT_LEN;

/// Encoded payload bytes
pub type EncodedPacket = heapless::Vec<u8, MAX_ENCODED_LEN>;

/// Known payload layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PacketLayout {
    /// `i32` water level then `f32` distance (current firmware)
    #[default]
    Int32Float,
    /// `u16` water level then `f32` distance
    Uint16Float,
    /// `f32` distance then `i32` water level
    FloatInt32,
}

impl PacketLayout {
    /// Human-readable field order
    pub const fn name(&self) -> &'static str {
        match self {
            PacketLayout::Int32Float => "int32,float",
            PacketLayout::Uint16Float => "uint16,float",
            PacketLayout::FloatInt32 => "float,int32",
        }
    }
}

/// Successfully decoded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPacket {
    /// Layout that matched
    pub layout: PacketLayout,
    /// Decoded values
    pub sample: RemoteSensorSample,
}

/// Resolve a raw frame into a sensor sample
///
/// Never panics; unknown lengths return
/// [`GatewayError::UnrecognizedPacket`].
pub fn decode(bytes: &[u8]) -> GatewayResult<DecodedPacket> {
    let len = bytes.len();

    let (layout, water_level, distance) = if len == INT32_FLOAT_LEN {
        (PacketLayout::Int32Float, read_i32(bytes, 0), read_f32(bytes, 4))
    } else if len == UINT16_FLOAT_LEN {
        (PacketLayout::Uint16Float, read_u16(bytes, 0) as i32, read_f32(bytes, 2))
    } else if len >= FLOAT_INT32_MIN_LEN {
        (PacketLayout::FloatInt32, read_i32(bytes, 4), read_f32(bytes, 0))
    } else {
        return Err(GatewayError::UnrecognizedPacket { len });
    };

    Ok(DecodedPacket {
        layout,
        sample: RemoteSensorSample {
            water_level,
            distance: Distance::from_wire(distance),
        },
    })
}

// Callers have already checked the length.
fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Node-side payload builder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPacket {
    /// Raw water level
    pub water_level: i32,
    /// Ultrasonic distance
    pub distance: Distance,
}

impl SensorPacket {
    /// Payload from a sample
    pub fn new(water_level: i32, distance: Distance) -> Self {
        Self { water_level, distance }
    }

    /// Encode in the given layout
    ///
    /// `Uint16Float` fails with [`GatewayError::ValueOutOfRange`] when the
    /// water level does not fit 16 bits.
    pub fn encode(&self, layout: PacketLayout) -> GatewayResult<EncodedPacket> {
        let distance = self.distance.to_wire().to_le_bytes();
        let mut out = EncodedPacket::new();

        // Capacity is MAX_ENCODED_LEN and no layout exceeds it.
        let pushed = match layout {
            PacketLayout::Int32Float => out
                .extend_from_slice(&self.water_level.to_le_bytes())
                .and_then(|_| out.extend_from_slice(&distance)),
            PacketLayout::Uint16Float => {
                let water = u16::try_from(self.water_level)
                    .map_err(|_| GatewayError::ValueOutOfRange { value: self.water_level })?;
                out.extend_from_slice(&water.to_le_bytes())
                    .and_then(|_| out.extend_from_slice(&distance))
            }
            PacketLayout::FloatInt32 => out
                .extend_from_slice(&distance)
                .and_then(|_| out.extend_from_slice(&self.water_level.to_le_bytes())),
        };
        pushed.map_err(|_| GatewayError::FrameTooLarge {
            len: MAX_ENCODED_LEN + 1,
            max: MAX_ENCODED_LEN,
        })?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(water: i32, distance: f32) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&water.to_le_bytes());
        bytes[4..].copy_from_slice(&distance.to_le_bytes());
        bytes
    }

    #[test]
    fn eight_bytes_use_int32_float() {
        let packet = decode(&frame(420, 123.45)).unwrap();
        assert_eq!(packet.layout, PacketLayout::Int32Float);
        assert_eq!(packet.sample.water_level, 420);
        assert_eq!(packet.sample.distance, Distance::Centimeters(123.45));
    }

    #[test]
    fn six_bytes_use_uint16_float() {
        let mut bytes = [0u8; 6];
        bytes[..2].copy_from_slice(&4095u16.to_le_bytes());
        bytes[2..].copy_from_slice(&17.5f32.to_le_bytes());

        let packet = decode(&bytes).unwrap();
        assert_eq!(packet.layout, PacketLayout::Uint16Float);
        assert_eq!(packet.sample.water_level, 4095);
        assert_eq!(packet.sample.distance, Distance::Centimeters(17.5));
    }

    #[test]
    fn longer_frames_use_reordered_layout() {
        let mut bytes = [0xAAu8; 12];
        bytes[..4].copy_from_slice(&88.0f32.to_le_bytes());
        bytes[4..8].copy_from_slice(&(-7i32).to_le_bytes());

        let packet = decode(&bytes).unwrap();
        assert_eq!(packet.layout, PacketLayout::FloatInt32);
        assert_eq!(packet.sample.water_level, -7);
        assert_eq!(packet.sample.distance, Distance::Centimeters(88.0));
    }

    #[test]
    fn short_and_odd_lengths_fail() {
        for len in [0usize, 1, 2, 3, 4, 5, 7] {
            let bytes = [0u8; 8];
            assert_eq!(
                decode(&bytes[..len]),
                Err(GatewayError::UnrecognizedPacket { len })
            );
        }
    }

    #[test]
    fn no_echo_sentinel_decodes() {
        let packet = decode(&frame(1000, -1.0)).unwrap();
        assert_eq!(packet.sample.distance, Distance::NoEcho);
    }

    #[test]
    fn encode_matches_decoder_layouts() {
        let packet = SensorPacket::new(1234, Distance::Centimeters(42.0));

        let bytes = packet.encode(PacketLayout::Int32Float).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..], &frame(1234, 42.0)[..]);

        let bytes = packet.encode(PacketLayout::Uint16Float).unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(decode(&bytes).unwrap().sample.water_level, 1234);
    }

    #[test]
    fn reordered_eight_bytes_are_read_as_int32_float() {
        // A FloatInt32 payload of exactly 8 bytes is indistinguishable from
        // Int32Float and resolves to rule 1.
        let packet = SensorPacket::new(600, Distance::Centimeters(10.0));
        let bytes = packet.encode(PacketLayout::FloatInt32).unwrap();

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.layout, PacketLayout::Int32Float);
        assert_eq!(decoded.sample.water_level, i32::from_le_bytes(10.0f32.to_le_bytes()));
    }

    #[test]
    fn uint16_rejects_out_of_range() {
        let packet = SensorPacket::new(70_000, Distance::NoEcho);
        assert_eq!(
            packet.encode(PacketLayout::Uint16Float),
            Err(GatewayError::ValueOutOfRange { value: 70_000 })
        );

        let packet = SensorPacket::new(-1, Distance::NoEcho);
        assert!(packet.encode(PacketLayout::Uint16Float).is_err());
    }
}
