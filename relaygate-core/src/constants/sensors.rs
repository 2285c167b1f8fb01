//! Node-Side Sensor Conversions

/// Speed of sound in air at 20 °C (cm per µs).
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// Distance value nodes put on the wire when no echo came back (cm).
pub const NO_ECHO_WIRE_VALUE: f32 = -1.0;
