//! Time management for the control loop
//!
//! The core never reads a clock on its own. Every entry point takes a
//! `now: Timestamp` so tests can drive time explicitly; the sources below are
//! for the code that owns the loop:
//! - `MonotonicTime` (std): milliseconds since the clock was created
//! - `MockTimeSource`: controllable time for tests
//!
//! `Delay` is only used by the blocking actuator ramp.

use core::cell::Cell;

/// Timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Blocking millisecond delay
///
/// Only the interpolated actuator ramp uses this. Anything that runs from a
/// scheduler task or a radio callback must not.
pub trait Delay {
    /// Block the caller for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Monotonic time source backed by `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Start counting from zero now
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

/// `Delay` implementation that parks the current thread
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

#[cfg(feature = "std")]
impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}

/// Shared-reference time source for tests
///
/// Can be advanced through `&self`, so a test can hand the same clock to a
/// mock delay and to the code under test.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    timestamp: Cell<Timestamp>,
}

impl MockTimeSource {
    /// Create at the given timestamp
    pub fn new(start: Timestamp) -> Self {
        Self { timestamp: Cell::new(start) }
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.timestamp.set(self.timestamp.get() + ms);
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.set(timestamp);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.timestamp.get()
    }
}

/// Milliseconds from `earlier` to `later`, zero if the clock went backwards
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_advances_through_shared_ref() {
        let time = MockTimeSource::new(0);
        let shared = &time;
        shared.advance(250);
        shared.advance(250);
        assert_eq!(time.now(), 500);
    }

    #[cfg(feature = "std")]
    #[test]
    fn thread_delay_blocks() {
        let clock = MonotonicTime::new();
        ThreadDelay.delay_ms(20);
        assert!(clock.now() >= 20);
    }

    #[test]
    fn elapsed_saturates() {
        assert_eq!(elapsed_ms(100, 350), 250);
        assert_eq!(elapsed_ms(350, 100), 0);
    }
}
