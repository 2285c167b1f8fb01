//! Gateway Control Loop Example
//!
//! Runs a simulated gateway for two minutes of virtual time: a node pushes
//! readings every second, the water level drains below the alert threshold,
//! the room heats up, and a dashboard trigger swings the actuator.
//!
//! ## What You'll Learn
//!
//! - Splitting the frame queue between the receive callback and the loop
//! - Building a [`Gateway`] from configuration
//! - Driving `tick` from a clock
//! - What the dashboard and uplink see
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_gateway_loop
//! ```

use relaygate_core::{
    config::GatewayConfig,
    constants::FRAME_QUEUE_CAPACITY,
    events::{AlertKind, VirtualChannel},
    gateway::Gateway,
    link::PeerAddress,
    packet::{PacketLayout, SensorPacket},
    queue::FrameQueue,
    state::{Distance, TelemetrySnapshot},
    time::{MockTimeSource, TimeSource},
    traits::{Actuator, Angle, DashboardSink, GatewaySensors, TelemetryUplink},
};

/// Room that warms by 0.1 °C per reading
struct Room {
    temperature: f32,
    reads: u32,
}

impl GatewaySensors for Room {
    fn read_temperature_humidity(&mut self) -> (f32, f32) {
        self.reads += 1;
        self.temperature += 0.1;
        // Every tenth read the sensor times out
        if self.reads % 10 == 0 {
            return (f32::NAN, f32::NAN);
        }
        (self.temperature, 62.0)
    }

    fn read_vibration(&mut self) -> bool {
        false
    }
}

struct Servo(Angle);

impl Actuator for Servo {
    fn set_position(&mut self, angle: Angle) {
        println!("    servo -> {}°", angle);
        self.0 = angle;
    }

    fn position(&self) -> Angle {
        self.0
    }
}

struct ConsoleDashboard;

impl DashboardSink for ConsoleDashboard {
    fn publish_alert(&mut self, kind: AlertKind, message: &str) {
        println!("    ALERT {}: {}", kind, message);
    }

    fn publish_metric(&mut self, channel: VirtualChannel, value: f32) {
        if channel == VirtualChannel::ActuatorTrigger {
            println!("    {} <- {}", channel, value);
        }
    }
}

struct ConsoleUplink;

impl TelemetryUplink for ConsoleUplink {
    type Error = core::fmt::Error;

    fn push_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), Self::Error> {
        let mut query = String::new();
        snapshot.write_query(&mut query)?;
        println!("    GET ?{}", query);
        Ok(())
    }
}

fn main() {
    println!("RelayGate Gateway Loop Example");
    println!("==============================\n");

    let node = PeerAddress::new([0x24, 0x6F, 0x28, 0x00, 0x00, 0x01]);
    let clock = MockTimeSource::new(0);
    let config = GatewayConfig::default();

    println!("Thresholds: water < {}, temp > {}°C, humidity > {}%",
        config.thresholds.low_water, config.thresholds.high_temp_c, config.thresholds.high_humidity_pct);
    println!();

    let mut queue: FrameQueue<FRAME_QUEUE_CAPACITY> = FrameQueue::new();
    let (mut producer, consumer) = queue.split();

    let room = Room { temperature: 33.0, reads: 0 };
    let mut gateway = match Gateway::new(
        &config,
        room,
        Servo(0),
        ConsoleDashboard,
        ConsoleUplink,
        consumer,
        clock.now(),
    ) {
        Ok(gateway) => gateway,
        Err(e) => {
            println!("✗ Gateway setup failed: {}", e);
            return;
        }
    };

    let mut water_level = 800;
    for second in 1..=120u64 {
        clock.set(second * 1000);

        // What the receive callback would do
        water_level -= 4;
        let packet = SensorPacket::new(water_level, Distance::Centimeters(40.0));
        if let Ok(bytes) = packet.encode(PacketLayout::Int32Float) {
            if let Err(e) = producer.on_receive(node, &bytes) {
                println!("  frame dropped: {}", e);
            }
        }

        if second == 30 {
            println!("t={:>3}s dashboard trigger", second);
            gateway.on_remote_trigger(1, clock.now());
        }

        let report = gateway.tick(clock.now());
        if report.motion_complete.is_some() {
            println!("t={:>3}s motion complete", second);
        }

        // Sub-second ticks so the vibration poll and actuator hold run on time
        for half in [250, 500, 750] {
            gateway.tick(clock.now() + half);
        }
    }

    println!();
    let stats = gateway.ingest_stats();
    println!("Frames decoded: {}, rejected: {}", stats.decoded, stats.rejected);
    println!("Last water level: {}", gateway.store().remote().water_level);
    println!("Last temperature: {:.1}°C", gateway.store().environment().temperature_c);
}
