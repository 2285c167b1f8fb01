//! Sensor Node Example
//!
//! Simulates a remote node: an ultrasonic probe that measures echo pulse
//! widths, a water-level probe, and a radio that occasionally loses its
//! peer entry.
//!
//! ## What You'll Learn
//!
//! - Converting echo pulses to distances
//! - Starting a [`SensorNode`] and handling a fatal link error
//! - How send failures drive peer re-registration
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_sensor_node
//! ```

use std::sync::atomic::Ordering;

use relaygate_core::{
    config::NodeConfig,
    link::{PeerAddress, PeerRegistration},
    node::{echo_distance, SensorNode},
    state::Distance,
    traits::{NodeSensors, PeerLink},
};

struct Probes {
    pulses_us: Vec<u32>,
    next: usize,
}

impl NodeSensors for Probes {
    fn read_water_level(&mut self) -> i32 {
        2100 - (self.next as i32) * 10
    }

    fn read_distance(&mut self) -> Distance {
        let pulse = self.pulses_us[self.next % self.pulses_us.len()];
        self.next += 1;
        echo_distance(pulse)
    }
}

/// Radio that reports every third send as failed
#[derive(Default)]
struct FlakyRadio {
    sends: u32,
    pending_failure: bool,
}

impl PeerLink for FlakyRadio {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        println!("  radio up in station mode");
        Ok(())
    }

    fn add_peer(&mut self, peer: &PeerRegistration) -> Result<(), Self::Error> {
        println!("  peer {} on channel {} (encrypted: {})", peer.address, peer.channel, peer.encrypted);
        Ok(())
    }

    fn send(&mut self, address: PeerAddress, payload: &[u8]) -> nb::Result<(), Self::Error> {
        self.sends += 1;
        self.pending_failure = self.sends % 3 == 0;
        println!("  send {} bytes to {}", payload.len(), address);
        Ok(())
    }
}

fn main() {
    println!("RelayGate Sensor Node Example");
    println!("=============================\n");

    println!("Echo conversion:");
    for pulse in [0u32, 583, 2915, 5831] {
        match echo_distance(pulse) {
            Distance::Centimeters(cm) => println!("  {:>5} µs -> {:.1} cm", pulse, cm),
            Distance::NoEcho => println!("  {:>5} µs -> no echo", pulse),
        }
    }
    println!();

    let config = NodeConfig::default();
    let probes = Probes { pulses_us: vec![5831, 5800, 0, 5750], next: 0 };
    let mut node = match SensorNode::new(&config, probes, FlakyRadio::default(), 0) {
        Ok(node) => node,
        Err(e) => {
            println!("✗ Invalid node config: {}", e);
            return;
        }
    };

    if let Err(e) = node.start() {
        // A real node restarts here
        println!("✗ {}", e);
        return;
    }

    for second in 1..=6u64 {
        node.tick(second * 1000);

        // What the send-completion callback would do
        let failed = node.link().pending_failure;
        let action = node.on_send_result(config.link.peer_address, !failed);
        println!("t={}s delivered: {} -> {:?}", second, !failed, action);
    }

    let stats = node.recovery().stats();
    println!();
    println!("Send failures: {}", stats.send_failures.load(Ordering::Relaxed));
    println!("Re-registrations: {}", stats.reregistrations.load(Ordering::Relaxed));
    println!("Frames sent: {}", node.stats().sent);
}
