//! Alert Thresholds and Actuator Positions
//!
//! Trip points are compared with plain `<` / `>`; there is no hysteresis band.
//! Edge detection in the alert evaluator is the only debounce.

// ===== ALERT THRESHOLDS =====

/// Water level below which the low-water alert fires (raw ADC counts).
///
/// Nodes report the raw 12-bit reading of a resistive level probe
/// (0 = dry, 4095 = fully submerged). 500 is roughly the bottom eighth
/// of the probe.
pub const LOW_WATER_THRESHOLD: i32 = 500;

/// Temperature above which the high-temperature alert fires (°C).
pub const HIGH_TEMP_THRESHOLD_C: f32 = 35.0;

/// Relative humidity above which the high-humidity alert fires (%).
///
/// DHT11-class sensors are ±5 %RH, so readings above 80 % are clearly humid
/// even at the bottom of the tolerance.
pub const HIGH_HUMIDITY_THRESHOLD_PCT: f32 = 80.0;

// ===== ACTUATOR POSITIONS =====

/// Servo angle the actuator returns to after every motion (degrees).
pub const ACTUATOR_REST_ANGLE: i32 = 0;

/// Servo angle commanded by the dashboard trigger (degrees).
pub const ACTUATOR_TRIGGER_ANGLE: i32 = 30;

/// Dashboard value on the trigger channel that starts a motion.
pub const TRIGGER_ON_VALUE: i32 = 1;
