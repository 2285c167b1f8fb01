//! Task Periods and Motion Timings
//!
//! All values are milliseconds of the monotonic control-loop clock.

// ===== GATEWAY TASK PERIODS =====

/// Climate read and dashboard publish period.
///
/// DHT11 sensors cannot be read faster than about once per second;
/// two seconds leaves margin for the sensor's own conversion time.
pub const ENVIRONMENT_PERIOD_MS: u32 = 2000;

/// Vibration switch poll period.
pub const VIBRATION_PERIOD_MS: u32 = 500;

/// Outbound HTTP snapshot period.
///
/// The spreadsheet backend rate-limits scripted requests; once a minute is
/// well inside its quota.
pub const SNAPSHOT_PERIOD_MS: u32 = 60_000;

// ===== NODE TIMING =====

/// Sensor node transmit period.
pub const NODE_SEND_PERIOD_MS: u32 = 1000;

// ===== ACTUATOR MOTION =====

/// How long a dashboard-triggered move holds before returning to rest.
pub const ACTUATOR_HOLD_MS: u32 = 800;

/// Total duration of the blocking interpolated ramp.
pub const RAMP_DURATION_MS: u32 = 1000;

/// Number of intermediate positions in the interpolated ramp.
///
/// 50 steps over one second gives a 20 ms step, one servo PWM frame.
pub const RAMP_STEPS: u16 = 50;
