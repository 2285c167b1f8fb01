//! Error Types for Gateway Ingestion and Control
//!
//! ## Design Philosophy
//!
//! The gateway must keep running. Nothing in the core panics on bad input and
//! no failure is escalated past the control loop except one: a link layer that
//! refuses to initialise at boot.
//!
//! 1. **Small Size**: variants carry a few integers or a `&'static str`, so the
//!    enum stays `Copy` and can be returned from callbacks cheaply.
//!
//! 2. **No Heap Allocation**: messages are static strings only.
//!
//! 3. **Recoverable by Default**: callers log and move on for every variant
//!    except [`GatewayError::LinkInitFailed`].
//!
//! ## Error Categories
//!
//! ### Ingestion
//! - `UnrecognizedPacket`: frame length matches no known layout, frame dropped
//! - `FrameTooLarge` / `QueueFull`: receive path could not buffer the frame
//!
//! ### Local Sensors
//! - `InvalidReading`: NaN from the climate sensor, cycle skipped
//!
//! ### Radio Link
//! - `LinkInitFailed`: fatal, the device should restart
//! - `PeerRegistrationFailed`, `LinkBusy`, `SendFailed`: transient
//!
//! ### Setup
//! - `SchedulerFull`, `InvalidConfig`, `ValueOutOfRange`
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use relaygate_core::{decode, GatewayError};
//!
//! fn on_frame(bytes: &[u8]) {
//!     match decode(bytes) {
//!         Ok(_packet) => {
//!             // store.apply_remote(packet.sample)
//!         }
//!         Err(GatewayError::UnrecognizedPacket { .. }) => {
//!             // Old or foreign firmware; keep the previous sample
//!         }
//!         Err(_) => {}
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GatewayError {
    /// Frame length matched none of the known wire layouts
    #[error("Unrecognized packet of {len} bytes")]
    UnrecognizedPacket {
        /// Length of the rejected frame
        len: usize,
    },

    /// Local sensor produced a reading that cannot be committed
    #[error("Invalid reading: {reason}")]
    InvalidReading {
        /// Which part of the reading was rejected
        reason: &'static str,
    },

    /// Inbound frame does not fit the receive buffer
    #[error("Frame of {len} bytes exceeds limit {max}")]
    FrameTooLarge {
        /// Length of the offered frame
        len: usize,
        /// Largest frame the queue stores
        max: usize,
    },

    /// Inbound frame queue has no free slot
    #[error("Inbound queue full")]
    QueueFull,

    /// Scheduler task table is full
    #[error("Scheduler full: capacity {capacity}")]
    SchedulerFull {
        /// Number of task slots
        capacity: usize,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: &'static str,
    },

    /// Value does not fit the requested wire layout
    #[error("Value {value} out of range for wire layout")]
    ValueOutOfRange {
        /// The value that did not fit
        value: i32,
    },

    /// Radio link could not be initialised; unrecoverable without restart
    #[error("Link layer initialisation failed")]
    LinkInitFailed,

    /// Link layer refused the peer entry
    #[error("Peer registration failed")]
    PeerRegistrationFailed,

    /// Radio is busy; try again on a later tick
    #[error("Link busy")]
    LinkBusy,

    /// Link layer rejected the send
    #[error("Send failed")]
    SendFailed,
}

impl GatewayError {
    /// Whether the device must restart after this error
    pub const fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::LinkInitFailed)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for GatewayError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::UnrecognizedPacket { len } =>
                defmt::write!(fmt, "Unrecognized packet of {} bytes", len),
            Self::InvalidReading { reason } =>
                defmt::write!(fmt, "Invalid reading: {}", reason),
            Self::FrameTooLarge { len, max } =>
                defmt::write!(fmt, "Frame {} bytes exceeds {}", len, max),
            Self::QueueFull =>
                defmt::write!(fmt, "Inbound queue full"),
            Self::SchedulerFull { capacity } =>
                defmt::write!(fmt, "Scheduler full ({})", capacity),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
            Self::ValueOutOfRange { value } =>
                defmt::write!(fmt, "Value {} out of range", value),
            Self::LinkInitFailed =>
                defmt::write!(fmt, "Link init failed"),
            Self::PeerRegistrationFailed =>
                defmt::write!(fmt, "Peer registration failed"),
            Self::LinkBusy =>
                defmt::write!(fmt, "Link busy"),
            Self::SendFailed =>
                defmt::write!(fmt, "Send failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_link_init_is_fatal() {
        assert!(GatewayError::LinkInitFailed.is_fatal());
        assert!(!GatewayError::SendFailed.is_fatal());
        assert!(!GatewayError::UnrecognizedPacket { len: 3 }.is_fatal());
    }

    #[cfg(feature = "std")]
    #[test]
    fn messages_carry_context() {
        let err = GatewayError::UnrecognizedPacket { len: 5 };
        assert_eq!(err.to_string(), "Unrecognized packet of 5 bytes");

        let err = GatewayError::FrameTooLarge { len: 300, max: 250 };
        assert_eq!(err.to_string(), "Frame of 300 bytes exceeds limit 250");
    }
}
