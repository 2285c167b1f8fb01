//! Hosted Gateway Example
//!
//! Runs the gateway loop on a desktop against a real MQTT broker and HTTP
//! endpoint, with simulated sensors standing in for the board.
//!
//! ## Running the Example
//!
//! ```bash
//! RELAYGATE_BROKER=localhost RELAYGATE_SNAPSHOT_URL=http://localhost:8080/exec \
//!     cargo run -p relaygate-connectors --example hosted_gateway
//! ```

use std::thread;
use std::time::Duration;

use relaygate_connectors::{HttpConfig, MqttConfig, MqttDashboard, SnapshotUplink};
use relaygate_core::{
    config::GatewayConfig,
    constants::FRAME_QUEUE_CAPACITY,
    gateway::Gateway,
    queue::FrameQueue,
    time::{MonotonicTime, TimeSource},
    traits::{Actuator, Angle, GatewaySensors},
};

struct SimulatedSensors {
    tick: u32,
}

impl GatewaySensors for SimulatedSensors {
    fn read_temperature_humidity(&mut self) -> (f32, f32) {
        self.tick += 1;
        (30.0 + (self.tick % 20) as f32 * 0.5, 70.0)
    }

    fn read_vibration(&mut self) -> bool {
        false
    }
}

struct LoggedServo(Angle);

impl Actuator for LoggedServo {
    fn set_position(&mut self, angle: Angle) {
        println!("servo -> {}°", angle);
        self.0 = angle;
    }

    fn position(&self) -> Angle {
        self.0
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let broker = std::env::var("RELAYGATE_BROKER").unwrap_or_else(|_| "localhost".into());
    let snapshot_url = std::env::var("RELAYGATE_SNAPSHOT_URL")
        .unwrap_or_else(|_| "http://localhost:8080/exec".into());

    let dashboard = MqttDashboard::connect(MqttConfig::new(broker, 1883).client_id("relaygate-demo"))?;
    let uplink = SnapshotUplink::new(HttpConfig::new(snapshot_url).timeout_secs(10))?;

    let clock = MonotonicTime::new();
    let mut queue: FrameQueue<FRAME_QUEUE_CAPACITY> = FrameQueue::new();
    let (_producer, consumer) = queue.split();

    let mut gateway = Gateway::new(
        &GatewayConfig::default(),
        SimulatedSensors { tick: 0 },
        LoggedServo(0),
        dashboard,
        uplink,
        consumer,
        clock.now(),
    )?;

    println!("Gateway running; publish 1 to relaygate/v4/set to trigger the servo");
    loop {
        let now = clock.now();
        while let Some(value) = gateway.dashboard().poll_trigger() {
            gateway.on_remote_trigger(value, now);
        }
        gateway.tick(now);

        let idle = gateway.time_until_next(clock.now()).min(50);
        thread::sleep(Duration::from_millis(idle));
    }
}
