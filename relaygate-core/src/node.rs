//! Sensor Node Transmit Loop
//!
//! ## Overview
//!
//! A node reads its water-level and distance probes once per send period,
//! packs them into the configured wire layout and pushes the frame to the
//! gateway. It never receives.
//!
//! ```text
//! start()
//!   link.init ──✗──→ LinkInitFailed (caller restarts the device)
//!   add_peer  ──✗──→ logged, keep going; recovery retries on first failure
//!
//! tick(now), every send period
//!   read probes → SensorPacket::encode(layout) → link.send
//!
//! send-completion callback
//!   on_send_result → LinkRecovery (re-register on failure)
//! ```
//!
//! Delivery is best-effort. A failed send is not retried; the next period
//! sends fresh readings anyway.
//!
//! ## Routing the Send Callback
//!
//! The radio reports send results from its own context, while the main loop
//! holds the node mutably. Boards put the [`LinkRecovery`] in a `static`, hand
//! the node a reference with [`SensorNode::with_recovery`], and call
//! [`LinkRecovery::on_send_result`] from the callback with a second link
//! handle. Registering a peer is a free function on ESP-NOW style radios, so
//! that handle carries no state:
//!
//! ```text
//! static RECOVERY: LinkRecovery = LinkRecovery::new(LINK);
//!
//! main loop:     node = SensorNode::with_recovery(&config, &RECOVERY, ..)
//! send callback: RECOVERY.on_send_result(&mut RadioHandle, mac, ok)
//! ```
//!
//! Hosted builds and tests can let the node own its recovery
//! ([`SensorNode::new`]) and forward results with
//! [`SensorNode::on_send_result`].

use core::borrow::Borrow;

use crate::config::NodeConfig;
use crate::constants::buffers::MAX_NODE_TASKS;
use crate::constants::sensors::SPEED_OF_SOUND_CM_PER_US;
use crate::errors::{GatewayError, GatewayResult};
use crate::link::{LinkRecovery, PeerAddress, RecoveryAction};
use crate::packet::{PacketLayout, SensorPacket};
use crate::scheduler::Scheduler;
use crate::state::Distance;
use crate::time::Timestamp;
use crate::traits::{NodeSensors, PeerLink};

/// Convert an ultrasonic echo pulse width to a distance
///
/// Half the round trip at the speed of sound. A zero-length pulse means the
/// echo timed out.
pub fn echo_distance(duration_us: u32) -> Distance {
    if duration_us == 0 {
        return Distance::NoEcho;
    }
    Distance::Centimeters(duration_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0)
}

/// Transmit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Frames handed to the link
    pub sent: u32,
    /// Sends refused because the radio was busy
    pub busy: u32,
    /// Sends the link rejected outright, or readings that could not be encoded
    pub failed: u32,
}

/// State the transmit task works on
pub struct NodeState<S, L> {
    sensors: S,
    link: L,
    peer: PeerAddress,
    layout: PacketLayout,
    stats: NodeStats,
}

impl<S: NodeSensors, L: PeerLink> NodeState<S, L> {
    fn transmit(&mut self) -> GatewayResult<SensorPacket> {
        let packet = SensorPacket::new(self.sensors.read_water_level(), self.sensors.read_distance());
        let bytes = packet.encode(self.layout).map_err(|e| {
            self.stats.failed += 1;
            e
        })?;

        match self.link.send(self.peer, &bytes) {
            Ok(()) => {
                self.stats.sent += 1;
                Ok(packet)
            }
            Err(nb::Error::WouldBlock) => {
                self.stats.busy += 1;
                Err(GatewayError::LinkBusy)
            }
            Err(nb::Error::Other(_e)) => {
                self.stats.failed += 1;
                log_warn!("send to {} rejected: {:?}", self.peer, _e);
                Err(GatewayError::SendFailed)
            }
        }
    }
}

/// Remote sensor node
///
/// `R` is the link recovery, owned by default or borrowed from a `static`
/// that the send callback shares.
pub struct SensorNode<S, L, R = LinkRecovery> {
    state: NodeState<S, L>,
    recovery: R,
    scheduler: Scheduler<NodeState<S, L>, MAX_NODE_TASKS>,
}

impl<S: NodeSensors, L: PeerLink> SensorNode<S, L> {
    /// Build the node with its own recovery and schedule its transmit task
    ///
    /// The link is not touched until [`start`](Self::start).
    pub fn new(config: &NodeConfig, sensors: S, link: L, now: Timestamp) -> GatewayResult<Self> {
        Self::with_recovery(config, LinkRecovery::new(config.link), sensors, link, now)
    }
}

impl<S: NodeSensors, L: PeerLink, R: Borrow<LinkRecovery>> SensorNode<S, L, R> {
    /// Build the node around an existing recovery
    ///
    /// The recovery must maintain the peer in `config.link`.
    pub fn with_recovery(
        config: &NodeConfig,
        recovery: R,
        sensors: S,
        link: L,
        now: Timestamp,
    ) -> GatewayResult<Self> {
        config.validate()?;
        if recovery.borrow().state() != &config.link {
            return Err(GatewayError::InvalidConfig { reason: "recovery peer differs from config" });
        }

        let mut scheduler: Scheduler<NodeState<S, L>, MAX_NODE_TASKS> = Scheduler::new();
        scheduler.register("transmit", config.send_period_ms, transmit_task, now)?;

        Ok(Self {
            state: NodeState {
                sensors,
                link,
                peer: config.link.peer_address,
                layout: config.wire_layout,
                stats: NodeStats::default(),
            },
            recovery,
            scheduler,
        })
    }

    /// Bring up the link and register the gateway peer
    ///
    /// Only link init failure is an error, and it is fatal.
    pub fn start(&mut self) -> GatewayResult<()> {
        self.state.link.init().map_err(|_e| {
            log_error!("link init failed: {:?}", _e);
            GatewayError::LinkInitFailed
        })?;

        if let Err(_e) = self.recovery.borrow().establish(&mut self.state.link) {
            log_warn!("continuing without peer entry: {}", _e);
        }
        Ok(())
    }

    /// Run the transmit task if due; returns tasks run
    pub fn tick(&mut self, now: Timestamp) -> usize {
        self.scheduler.run_pending(&mut self.state, now)
    }

    /// Read and send immediately, outside the schedule
    pub fn send_now(&mut self) -> GatewayResult<SensorPacket> {
        self.state.transmit()
    }

    /// Forward a send-completion notification to link recovery
    ///
    /// Needs the whole node; from a radio callback go through a shared
    /// [`LinkRecovery`] instead.
    pub fn on_send_result(&mut self, address: PeerAddress, success: bool) -> RecoveryAction {
        self.recovery.borrow().on_send_result(&mut self.state.link, address, success)
    }

    /// Link recovery state and counters
    pub fn recovery(&self) -> &LinkRecovery {
        self.recovery.borrow()
    }

    /// Transmit counters
    pub fn stats(&self) -> NodeStats {
        self.state.stats
    }

    /// Underlying link
    pub fn link(&self) -> &L {
        &self.state.link
    }

    /// Probes, mutably
    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.state.sensors
    }
}

fn transmit_task<S: NodeSensors, L: PeerLink>(state: &mut NodeState<S, L>, _now: Timestamp) {
    match state.transmit() {
        Ok(_packet) => log_debug!("sent water {} to {}", _packet.water_level, state.peer),
        Err(GatewayError::LinkBusy) => log_debug!("radio busy, skipping this period"),
        Err(_e) => log_warn!("transmit failed: {}", _e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::Ordering;

    use crate::config::DEFAULT_GATEWAY_ADDRESS;
    use crate::link::{ChannelPolicy, PeerLinkState, PeerRegistration};
    use crate::packet::decode;

    struct Probes {
        level: i32,
        distance: Distance,
    }

    impl NodeSensors for Probes {
        fn read_water_level(&mut self) -> i32 {
            self.level
        }

        fn read_distance(&mut self) -> Distance {
            self.distance
        }
    }

    #[derive(Default)]
    struct Radio {
        fail_init: bool,
        busy: bool,
        peers: heapless::Vec<PeerRegistration, 8>,
        frames: heapless::Vec<heapless::Vec<u8, 8>, 8>,
    }

    impl PeerLink for Radio {
        type Error = ();

        fn init(&mut self) -> Result<(), ()> {
            if self.fail_init { Err(()) } else { Ok(()) }
        }

        fn add_peer(&mut self, peer: &PeerRegistration) -> Result<(), ()> {
            self.peers.push(*peer).map_err(|_| ())
        }

        fn send(&mut self, _address: PeerAddress, payload: &[u8]) -> nb::Result<(), ()> {
            if self.busy {
                return Err(nb::Error::WouldBlock);
            }
            let frame = heapless::Vec::from_slice(payload).map_err(|_| nb::Error::Other(()))?;
            self.frames.push(frame).map_err(|_| nb::Error::Other(()))
        }
    }

    fn node(level: i32) -> SensorNode<Probes, Radio> {
        let probes = Probes { level, distance: Distance::Centimeters(42.5) };
        SensorNode::new(&NodeConfig::default(), probes, Radio::default(), 0).unwrap()
    }

    #[test]
    fn echo_conversion() {
        assert_eq!(echo_distance(0), Distance::NoEcho);
        let cm = echo_distance(1000).centimeters().unwrap();
        assert!((cm - 17.15).abs() < 1e-3);
    }

    #[test]
    fn start_registers_gateway_on_fixed_channel() {
        let mut node = node(700);
        node.start().unwrap();
        let peer = node.link().peers[0];
        assert_eq!(peer.address, NodeConfig::default().link.peer_address);
        assert_eq!(peer.channel, 6);
        assert!(!peer.encrypted);
    }

    #[test]
    fn init_failure_is_fatal() {
        let probes = Probes { level: 0, distance: Distance::NoEcho };
        let radio = Radio { fail_init: true, ..Default::default() };
        let mut node = SensorNode::new(&NodeConfig::default(), probes, radio, 0).unwrap();
        assert_eq!(node.start(), Err(GatewayError::LinkInitFailed));
        assert!(GatewayError::LinkInitFailed.is_fatal());
    }

    #[test]
    fn sends_once_per_period() {
        let mut node = node(700);
        node.start().unwrap();

        for now in (0..=3000).step_by(250) {
            node.tick(now);
        }
        assert_eq!(node.stats().sent, 3);

        let sample = decode(&node.link().frames[0]).unwrap().sample;
        assert_eq!(sample.water_level, 700);
        assert_eq!(sample.distance, Distance::Centimeters(42.5));
    }

    #[test]
    fn busy_radio_counted() {
        let mut node = node(700);
        node.start().unwrap();
        node.state.link.busy = true;
        assert_eq!(node.send_now(), Err(GatewayError::LinkBusy));
        assert_eq!(node.stats().busy, 1);
    }

    #[test]
    fn failed_send_reregisters() {
        let mut node = node(700);
        node.start().unwrap();
        let gateway = node.recovery().state().peer_address;

        assert_eq!(node.on_send_result(gateway, false), RecoveryAction::Reregistered);
        assert_eq!(node.link().peers.len(), 2);
    }

    #[test]
    fn callback_reaches_shared_recovery_while_node_is_borrowed() {
        static RECOVERY: LinkRecovery = LinkRecovery::new(PeerLinkState {
            peer_address: DEFAULT_GATEWAY_ADDRESS,
            channel_policy: ChannelPolicy::Fixed(6),
        });

        let config = NodeConfig::default();
        let probes = Probes { level: 700, distance: Distance::NoEcho };
        let mut node = SensorNode::with_recovery(&config, &RECOVERY, probes, Radio::default(), 0).unwrap();
        node.start().unwrap();

        // Callback side holds its own handle, not the node
        let mut callback_radio = Radio::default();
        let action = RECOVERY.on_send_result(&mut callback_radio, DEFAULT_GATEWAY_ADDRESS, false);
        assert_eq!(action, RecoveryAction::Reregistered);
        assert_eq!(callback_radio.peers.len(), 1);

        node.tick(1000);
        assert_eq!(node.stats().sent, 1);
        assert_eq!(node.recovery().stats().reregistrations.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn recovery_for_other_peer_rejected() {
        let recovery = LinkRecovery::new(PeerLinkState {
            peer_address: PeerAddress::new([1, 1, 1, 1, 1, 1]),
            channel_policy: ChannelPolicy::Fixed(6),
        });
        let probes = Probes { level: 1, distance: Distance::NoEcho };
        let result = SensorNode::with_recovery(&NodeConfig::default(), &recovery, probes, Radio::default(), 0);
        assert!(matches!(result, Err(GatewayError::InvalidConfig { .. })));
    }

    #[test]
    fn follow_station_registers_channel_zero() {
        let mut config = NodeConfig::default();
        config.link.channel_policy = ChannelPolicy::FollowStation;
        let probes = Probes { level: 1, distance: Distance::NoEcho };
        let mut node = SensorNode::new(&config, probes, Radio::default(), 0).unwrap();
        node.start().unwrap();

        assert_eq!(node.link().peers[0].channel, 0);
        let gateway = config.link.peer_address;
        assert_eq!(node.on_send_result(gateway, false), RecoveryAction::None);
        assert_eq!(node.link().peers.len(), 1);
    }
}
