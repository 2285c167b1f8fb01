//! Peer Registration and Link Recovery
//!
//! ## Overview
//!
//! Before a node can send to the gateway its link layer must hold a peer entry
//! for the gateway: address, radio channel, encryption off. The radio can
//! silently drop that entry, after which every send fails. There are no richer
//! diagnostics, so recovery is blind: re-register and try again next time.
//!
//! ## Deployment Variants
//!
//! Both variants share [`LinkRecovery`]; the [`ChannelPolicy`] picks the
//! behaviour.
//!
//! | Policy          | Registered channel | On send failure            |
//! |-----------------|--------------------|----------------------------|
//! | `Fixed(ch)`     | `ch`               | re-register on `ch`        |
//! | `FollowStation` | `0`                | nothing                    |
//!
//! With `FollowStation` the peer rides on whatever channel the station
//! interface is using, and the station's own reconnect logic is the recovery.
//!
//! ## Callback Context
//!
//! [`LinkRecovery::on_send_result`] is called from the radio's send-completion
//! callback. It takes `&self`, touches only atomic counters and makes one
//! non-blocking `add_peer` call.
//!
//! ## Known Risk
//!
//! There is no retry limit and no backoff. A peer that is gone for good is
//! re-registered after every failed send, forever.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::constants::link::{FOLLOW_STATION_CHANNEL, PEER_ADDRESS_LEN};
use crate::errors::{GatewayError, GatewayResult};
use crate::traits::PeerLink;

/// Link-layer (MAC) address of a peer
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerAddress(pub [u8; PEER_ADDRESS_LEN]);

impl PeerAddress {
    /// Address from raw bytes
    pub const fn new(bytes: [u8; PEER_ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; PEER_ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// How the peer link chooses its radio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelPolicy {
    /// Pin to a specific channel
    Fixed(u8),
    /// Use whatever channel the station interface is on
    FollowStation,
}

impl ChannelPolicy {
    /// Channel number to put in the peer entry
    pub const fn peer_channel(&self) -> u8 {
        match self {
            ChannelPolicy::Fixed(channel) => *channel,
            ChannelPolicy::FollowStation => FOLLOW_STATION_CHANNEL,
        }
    }

    /// Whether send failures trigger re-registration
    pub const fn reregisters_on_failure(&self) -> bool {
        matches!(self, ChannelPolicy::Fixed(_))
    }
}

/// Peer entry handed to the link layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerRegistration {
    /// Peer address
    pub address: PeerAddress,
    /// Radio channel, 0 = follow station
    pub channel: u8,
    /// Link-layer encryption; always off
    pub encrypted: bool,
}

/// The whole runtime state of the peer link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerLinkState {
    /// Gateway address
    pub peer_address: PeerAddress,
    /// Channel policy
    pub channel_policy: ChannelPolicy,
}

impl PeerLinkState {
    /// Entry to register with the link layer
    pub const fn registration(&self) -> PeerRegistration {
        PeerRegistration {
            address: self.peer_address,
            channel: self.channel_policy.peer_channel(),
            encrypted: false,
        }
    }
}

/// What a send-result notification led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Send succeeded, or the policy ignores failures
    None,
    /// Peer entry was re-issued
    Reregistered,
    /// Re-registration was attempted and refused
    ReregistrationFailed,
}

/// Recovery counters
#[derive(Debug, Default)]
pub struct RecoveryStats {
    /// Failed sends reported by the link layer
    pub send_failures: AtomicU32,
    /// Successful sends reported by the link layer
    pub send_successes: AtomicU32,
    /// Re-registrations issued
    pub reregistrations: AtomicU32,
    /// Re-registrations the link layer refused
    pub reregistration_failures: AtomicU32,
}

impl RecoveryStats {
    /// All counters at zero
    pub const fn new() -> Self {
        Self {
            send_failures: AtomicU32::new(0),
            send_successes: AtomicU32::new(0),
            reregistrations: AtomicU32::new(0),
            reregistration_failures: AtomicU32::new(0),
        }
    }
}

/// Send-failure recovery state machine
///
/// Everything after construction goes through `&self`, so one instance can
/// sit in a `static` and be shared by the transmit loop and the
/// send-completion callback.
#[derive(Debug)]
pub struct LinkRecovery {
    state: PeerLinkState,
    stats: RecoveryStats,
}

impl LinkRecovery {
    /// Recovery for the given peer
    pub const fn new(state: PeerLinkState) -> Self {
        Self { state, stats: RecoveryStats::new() }
    }

    /// Peer being maintained
    pub fn state(&self) -> &PeerLinkState {
        &self.state
    }

    /// Counters
    pub fn stats(&self) -> &RecoveryStats {
        &self.stats
    }

    /// Initial peer registration
    pub fn establish<L: PeerLink>(&self, link: &mut L) -> GatewayResult<()> {
        let registration = self.state.registration();
        link.add_peer(&registration).map_err(|_e| {
            log_error!("adding peer {} failed: {:?}", registration.address, _e);
            GatewayError::PeerRegistrationFailed
        })?;
        log_info!("peer {} added on channel {}", registration.address, registration.channel);
        Ok(())
    }

    /// Handle a send-completion notification
    ///
    /// Safe to call from the send-completion callback.
    pub fn on_send_result<L: PeerLink>(
        &self,
        link: &mut L,
        address: PeerAddress,
        success: bool,
    ) -> RecoveryAction {
        if success {
            self.stats.send_successes.fetch_add(1, Ordering::Relaxed);
            return RecoveryAction::None;
        }

        self.stats.send_failures.fetch_add(1, Ordering::Relaxed);
        if !self.state.channel_policy.reregisters_on_failure() {
            log_debug!("send to {} failed; station reconnect will recover", address);
            return RecoveryAction::None;
        }

        log_warn!("send to {} failed, re-adding peer", address);
        match link.add_peer(&self.state.registration()) {
            Ok(()) => {
                self.stats.reregistrations.fetch_add(1, Ordering::Relaxed);
                RecoveryAction::Reregistered
            }
            Err(_e) => {
                self.stats.reregistration_failures.fetch_add(1, Ordering::Relaxed);
                log_warn!("re-adding peer failed: {:?}", _e);
                RecoveryAction::ReregistrationFailed
            }
        }
    }
}
