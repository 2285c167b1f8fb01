//! Buffer Sizes and Table Capacities
//!
//! Everything is statically sized; these bound the RAM the core uses.

/// Slots in the inbound frame queue.
///
/// `heapless::spsc::Queue` keeps one slot empty, so this holds 7 frames.
/// Nodes send once per second and the loop drains every tick, so more than
/// one or two queued frames means the loop is stalled (e.g. during a ramp).
pub const FRAME_QUEUE_CAPACITY: usize = 8;

/// Periodic tasks the gateway registers (environment, vibration, snapshot).
pub const MAX_GATEWAY_TASKS: usize = 4;

/// Periodic tasks a sensor node registers (transmit).
pub const MAX_NODE_TASKS: usize = 2;

/// Capacity of a formatted alert message (bytes).
pub const ALERT_MESSAGE_LEN: usize = 64;

/// Alert transitions a single evaluation can produce (one per alert kind).
pub const MAX_TRANSITIONS: usize = 4;
