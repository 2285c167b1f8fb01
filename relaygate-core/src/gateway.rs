//! Gateway Control Loop
//!
//! ## Overview
//!
//! [`Gateway`] wires the pieces together. The board's main loop calls
//! [`Gateway::tick`] as often as it likes; each tick runs three phases in a
//! fixed order:
//!
//! ```text
//! tick(now)
//!   1. drain frame queue → decode → store.remote → water alert
//!   2. scheduler.run_pending
//!        ├─ environment (2 s):  read climate → store → V2/V3 → alerts → V1/V5
//!        ├─ vibration (500 ms): read switch → on change: alert + V6
//!        └─ snapshot (60 s):    store.snapshot → uplink
//!   3. actuator.service → on completion: V4 = 0
//! ```
//!
//! Dashboard triggers arrive through [`Gateway::on_remote_trigger`], called by
//! the dashboard connector whenever the trigger channel is written.
//!
//! ## Failure Policy
//!
//! | Failure                     | Effect                                 |
//! |-----------------------------|----------------------------------------|
//! | Frame of unknown layout     | logged, dropped, store unchanged       |
//! | NaN temperature or humidity | environment cycle skipped entirely     |
//! | Snapshot upload error       | logged, next attempt one period later  |
//!
//! Nothing in the loop is fatal.

use crate::actuator::{ActuatorController, MotionComplete};
use crate::alerts::{AlertEvaluator, AlertTransition};
use crate::config::GatewayConfig;
use crate::constants::buffers::MAX_GATEWAY_TASKS;
use crate::constants::thresholds::TRIGGER_ON_VALUE;
use crate::errors::GatewayResult;
use crate::events::VirtualChannel;
use crate::packet::{decode, DecodedPacket};
use crate::queue::{FrameConsumer, QueueStats};
use crate::scheduler::Scheduler;
use crate::state::SensorStateStore;
use crate::time::{Delay, Timestamp};
use crate::traits::{Actuator, Angle, DashboardSink, GatewaySensors, TelemetryUplink};

/// Frame ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Frames decoded into the store
    pub decoded: u32,
    /// Frames dropped for an unknown layout
    pub rejected: u32,
}

/// What one [`Gateway::tick`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frames taken off the queue
    pub frames: usize,
    /// Scheduled tasks that ran
    pub tasks_run: usize,
    /// Actuator motion that finished this tick
    pub motion_complete: Option<MotionComplete>,
}

/// Everything the scheduled tasks operate on
pub struct GatewayState<S, A: Actuator, D, U> {
    store: SensorStateStore,
    evaluator: AlertEvaluator,
    controller: ActuatorController<A>,
    sensors: S,
    dashboard: D,
    uplink: U,
    ingest: IngestStats,
}

/// Gateway node
pub struct Gateway<'q, S, A, D, U, const Q: usize>
where
    A: Actuator,
{
    state: GatewayState<S, A, D, U>,
    scheduler: Scheduler<GatewayState<S, A, D, U>, MAX_GATEWAY_TASKS>,
    frames: FrameConsumer<'q, Q>,
}

impl<'q, S, A, D, U, const Q: usize> Gateway<'q, S, A, D, U, Q>
where
    S: GatewaySensors,
    A: Actuator,
    D: DashboardSink,
    U: TelemetryUplink,
{
    /// Build the gateway and register its periodic tasks
    ///
    /// Tasks first run one period after `now`.
    pub fn new(
        config: &GatewayConfig,
        sensors: S,
        actuator: A,
        dashboard: D,
        uplink: U,
        frames: FrameConsumer<'q, Q>,
        now: Timestamp,
    ) -> GatewayResult<Self> {
        config.validate()?;

        let mut scheduler: Scheduler<GatewayState<S, A, D, U>, MAX_GATEWAY_TASKS> = Scheduler::new();
        let periods = &config.schedule;
        scheduler.register("environment", periods.environment_ms, environment_task, now)?;
        scheduler.register("vibration", periods.vibration_ms, vibration_task, now)?;
        scheduler.register("snapshot", periods.snapshot_ms, snapshot_task, now)?;

        log_info!(
            "gateway up: environment {} ms, vibration {} ms, snapshot {} ms",
            periods.environment_ms,
            periods.vibration_ms,
            periods.snapshot_ms
        );

        Ok(Self {
            state: GatewayState {
                store: SensorStateStore::new(),
                evaluator: AlertEvaluator::new(config.thresholds),
                controller: ActuatorController::new(actuator, config.actuator),
                sensors,
                dashboard,
                uplink,
                ingest: IngestStats::default(),
            },
            scheduler,
            frames,
        })
    }

    /// One pass of the control loop
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let mut report = TickReport::default();

        while let Some(frame) = self.frames.pop() {
            report.frames += 1;
            let _ = self.ingest(&frame.payload);
        }

        report.tasks_run = self.scheduler.run_pending(&mut self.state, now);

        report.motion_complete = self.state.controller.service(now);
        if report.motion_complete.is_some() {
            self.state.dashboard.publish_metric(VirtualChannel::ActuatorTrigger, 0.0);
        }

        report
    }

    /// Decode one payload into the store and evaluate the water alert
    ///
    /// [`tick`](Self::tick) calls this for every queued frame; it is public
    /// for boards that deliver frames synchronously.
    pub fn ingest(&mut self, payload: &[u8]) -> GatewayResult<DecodedPacket> {
        let GatewayState { store, evaluator, dashboard, ingest, .. } = &mut self.state;
        ingest_payload(store, evaluator, dashboard, ingest, payload)
    }

    /// Handle a write to the dashboard trigger channel
    ///
    /// Returns whether a motion was started. Only the "on" value triggers.
    pub fn on_remote_trigger(&mut self, value: i32, now: Timestamp) -> bool {
        if value != TRIGGER_ON_VALUE {
            log_debug!("trigger value {} ignored", value);
            return false;
        }
        self.state.controller.trigger(now);
        true
    }

    /// Ramp the actuator to `target`. **Blocks** for the ramp duration.
    ///
    /// Frames queued during the ramp are ingested between steps. Scheduled
    /// tasks do not run until the next tick.
    pub fn ramp_actuator<Dl: Delay>(&mut self, target: Angle, delay: &mut Dl) {
        let GatewayState { store, evaluator, controller, dashboard, ingest, .. } = &mut self.state;
        let frames = &mut self.frames;
        controller.ramp_to(target, delay, || {
            while let Some(frame) = frames.pop() {
                let _ = ingest_payload(store, evaluator, dashboard, ingest, &frame.payload);
            }
        });
    }

    /// Milliseconds until a scheduled task is next due
    pub fn time_until_next(&self, now: Timestamp) -> u64 {
        // Three tasks are always registered
        self.scheduler.time_until_next(now).unwrap_or(0)
    }

    /// Latest sensor state
    pub fn store(&self) -> &SensorStateStore {
        &self.state.store
    }

    /// Alert latches
    pub fn evaluator(&self) -> &AlertEvaluator {
        &self.state.evaluator
    }

    /// Actuator controller
    pub fn controller(&self) -> &ActuatorController<A> {
        &self.state.controller
    }

    /// Dashboard sink
    pub fn dashboard(&self) -> &D {
        &self.state.dashboard
    }

    /// Dashboard sink, mutably
    pub fn dashboard_mut(&mut self) -> &mut D {
        &mut self.state.dashboard
    }

    /// Local sensors, mutably
    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.state.sensors
    }

    /// Telemetry uplink
    pub fn uplink(&self) -> &U {
        &self.state.uplink
    }

    /// Frame ingestion counters
    pub fn ingest_stats(&self) -> IngestStats {
        self.state.ingest
    }

    /// Inbound queue counters
    pub fn queue_stats(&self) -> &QueueStats {
        self.frames.stats()
    }
}

fn ingest_payload<D: DashboardSink>(
    store: &mut SensorStateStore,
    evaluator: &mut AlertEvaluator,
    dashboard: &mut D,
    stats: &mut IngestStats,
    payload: &[u8],
) -> GatewayResult<DecodedPacket> {
    let packet = decode(payload).map_err(|e| {
        stats.rejected = stats.rejected.wrapping_add(1);
        log_warn!("dropping frame: {}", e);
        e
    })?;

    stats.decoded = stats.decoded.wrapping_add(1);
    store.apply_remote(packet.sample);
    log_debug!(
        "remote sample ({}): water {} distance {:?}",
        packet.layout.name(),
        packet.sample.water_level,
        packet.sample.distance
    );

    if let Some(transition) = evaluator.evaluate_remote(&packet.sample) {
        publish_transition(dashboard, &transition);
    }
    Ok(packet)
}

fn publish_transition<D: DashboardSink>(dashboard: &mut D, transition: &AlertTransition) {
    match transition {
        AlertTransition::Raised(event) => {
            dashboard.publish_alert(event.kind, event.message.as_str());
            if let Some(channel) = event.kind.indicator() {
                dashboard.publish_metric(channel, 1.0);
            }
        }
        AlertTransition::Cleared(kind) => {
            if let Some(channel) = kind.indicator() {
                dashboard.publish_metric(channel, 0.0);
            }
        }
    }
}

fn environment_task<S, A, D, U>(state: &mut GatewayState<S, A, D, U>, _now: Timestamp)
where
    S: GatewaySensors,
    A: Actuator,
    D: DashboardSink,
{
    let (temperature, humidity) = state.sensors.read_temperature_humidity();
    let sample = match state.store.commit_environment(temperature, humidity) {
        Ok(sample) => sample,
        Err(_e) => {
            log_warn!("climate read skipped: {}", _e);
            return;
        }
    };

    let dashboard = &mut state.dashboard;
    dashboard.publish_metric(VirtualChannel::Temperature, sample.temperature_c);
    dashboard.publish_metric(VirtualChannel::Humidity, sample.humidity_pct);

    for transition in state.evaluator.evaluate_environment(&sample) {
        publish_transition(dashboard, &transition);
    }

    let remote = state.store.remote();
    dashboard.publish_metric(VirtualChannel::WaterLevel, remote.water_level as f32);
    dashboard.publish_metric(VirtualChannel::Distance, remote.distance.to_wire());
}

fn vibration_task<S, A, D, U>(state: &mut GatewayState<S, A, D, U>, _now: Timestamp)
where
    S: GatewaySensors,
    A: Actuator,
    D: DashboardSink,
{
    let detected = state.sensors.read_vibration();
    if let Some(changed) = state.store.update_vibration(detected) {
        if let Some(transition) = state.evaluator.evaluate_vibration(changed) {
            publish_transition(&mut state.dashboard, &transition);
        }
    }
}

fn snapshot_task<S, A, D, U>(state: &mut GatewayState<S, A, D, U>, _now: Timestamp)
where
    A: Actuator,
    U: TelemetryUplink,
{
    let snapshot = state.store.snapshot();
    match state.uplink.push_snapshot(&snapshot) {
        Ok(()) => log_debug!("snapshot sent"),
        Err(_e) => log_warn!("snapshot upload failed: {:?}", _e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AlertKind;
    use crate::link::PeerAddress;
    use crate::packet::{PacketLayout, SensorPacket};
    use crate::queue::FrameQueue;
    use crate::state::{Distance, TelemetrySnapshot};

    const NODE: PeerAddress = PeerAddress::new([0xAA, 0, 0, 0, 0, 1]);

    #[derive(Default)]
    struct Bench {
        climate: (f32, f32),
        vibration: bool,
    }

    impl GatewaySensors for Bench {
        fn read_temperature_humidity(&mut self) -> (f32, f32) {
            self.climate
        }

        fn read_vibration(&mut self) -> bool {
            self.vibration
        }
    }

    #[derive(Default)]
    struct Servo(Angle);

    impl Actuator for Servo {
        fn set_position(&mut self, angle: Angle) {
            self.0 = angle;
        }

        fn position(&self) -> Angle {
            self.0
        }
    }

    #[derive(Default)]
    struct Dash {
        alerts: heapless::Vec<AlertKind, 16>,
        metrics: heapless::Vec<(VirtualChannel, f32), 64>,
    }

    impl DashboardSink for Dash {
        fn publish_alert(&mut self, kind: AlertKind, _message: &str) {
            let _ = self.alerts.push(kind);
        }

        fn publish_metric(&mut self, channel: VirtualChannel, value: f32) {
            let _ = self.metrics.push((channel, value));
        }
    }

    impl Dash {
        fn last(&self, channel: VirtualChannel) -> Option<f32> {
            self.metrics.iter().rev().find(|(c, _)| *c == channel).map(|(_, v)| *v)
        }
    }

    #[derive(Default)]
    struct Uplink {
        sent: u32,
        fail: bool,
    }

    impl TelemetryUplink for Uplink {
        type Error = ();

        fn push_snapshot(&mut self, _snapshot: &TelemetrySnapshot) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.sent += 1;
            Ok(())
        }
    }

    fn frame(level: i32, cm: f32) -> heapless::Vec<u8, 8> {
        SensorPacket::new(level, Distance::Centimeters(cm))
            .encode(PacketLayout::Int32Float)
            .unwrap()
    }

    #[test]
    fn frames_drained_each_tick() {
        let mut queue = FrameQueue::<4>::new();
        let (mut producer, consumer) = queue.split();
        let mut gw = Gateway::new(
            &GatewayConfig::default(),
            Bench::default(),
            Servo::default(),
            Dash::default(),
            Uplink::default(),
            consumer,
            0,
        )
        .unwrap();

        producer.on_receive(NODE, &frame(420, 123.45)).unwrap();
        producer.on_receive(NODE, &[1, 2, 3]).unwrap();
        producer.on_receive(NODE, &frame(410, 100.0)).unwrap();

        let report = gw.tick(10);
        assert_eq!(report.frames, 3);
        assert_eq!(report.tasks_run, 0);
        assert_eq!(gw.ingest_stats(), IngestStats { decoded: 2, rejected: 1 });
        assert_eq!(gw.store().remote().water_level, 410);
        assert_eq!(gw.dashboard().alerts.as_slice(), &[AlertKind::WaterLow]);
    }

    #[test]
    fn environment_publishes_and_alerts() {
        let mut queue = FrameQueue::<4>::new();
        let (_producer, consumer) = queue.split();
        let sensors = Bench { climate: (36.0, 50.0), vibration: false };
        let mut gw = Gateway::new(
            &GatewayConfig::default(),
            sensors,
            Servo::default(),
            Dash::default(),
            Uplink::default(),
            consumer,
            0,
        )
        .unwrap();

        gw.tick(1999);
        assert_eq!(gw.dashboard().last(VirtualChannel::Temperature), None);

        gw.tick(2000);
        let dash = gw.dashboard();
        assert_eq!(dash.last(VirtualChannel::Temperature), Some(36.0));
        assert_eq!(dash.last(VirtualChannel::Humidity), Some(50.0));
        assert_eq!(dash.last(VirtualChannel::WaterLevel), Some(0.0));
        assert_eq!(dash.alerts.as_slice(), &[AlertKind::TempHigh]);

        gw.tick(4000);
        assert_eq!(gw.dashboard().alerts.len(), 1);
    }

    #[test]
    fn vibration_publishes_on_change_only() {
        let mut queue = FrameQueue::<4>::new();
        let (_producer, consumer) = queue.split();
        let mut gw = Gateway::new(
            &GatewayConfig::default(),
            Bench::default(),
            Servo::default(),
            Dash::default(),
            Uplink::default(),
            consumer,
            0,
        )
        .unwrap();

        gw.tick(500);
        assert!(gw.dashboard().metrics.is_empty());

        gw.sensors_mut().vibration = true;
        gw.tick(1000);
        gw.tick(1500);
        assert_eq!(gw.dashboard().alerts.as_slice(), &[AlertKind::Vibration]);
        assert_eq!(gw.dashboard().last(VirtualChannel::Vibration), Some(1.0));

        gw.sensors_mut().vibration = false;
        gw.tick(2000);
        assert_eq!(gw.dashboard().last(VirtualChannel::Vibration), Some(0.0));
        assert_eq!(gw.dashboard().alerts.len(), 1);
    }

    #[test]
    fn trigger_holds_then_resets_channel() {
        let mut queue = FrameQueue::<4>::new();
        let (_producer, consumer) = queue.split();
        let mut gw = Gateway::new(
            &GatewayConfig::default(),
            Bench::default(),
            Servo::default(),
            Dash::default(),
            Uplink::default(),
            consumer,
            0,
        )
        .unwrap();

        assert!(!gw.on_remote_trigger(0, 100));
        assert!(gw.on_remote_trigger(1, 100));
        assert_eq!(gw.controller().position(), 30);

        assert!(gw.tick(899).motion_complete.is_none());
        assert!(gw.tick(900).motion_complete.is_some());
        assert_eq!(gw.controller().position(), 0);
        assert_eq!(gw.dashboard().last(VirtualChannel::ActuatorTrigger), Some(0.0));
        assert!(gw.tick(950).motion_complete.is_none());
    }

    #[test]
    fn snapshot_failure_is_swallowed() {
        let mut queue = FrameQueue::<4>::new();
        let (_producer, consumer) = queue.split();
        let mut gw = Gateway::new(
            &GatewayConfig::default(),
            Bench { climate: (20.0, 40.0), vibration: false },
            Servo::default(),
            Dash::default(),
            Uplink { sent: 0, fail: true },
            consumer,
            0,
        )
        .unwrap();

        gw.tick(60_000);
        assert_eq!(gw.uplink().sent, 0);
        // Loop keeps running and the snapshot task stays scheduled
        gw.tick(120_000);
        assert_eq!(gw.store().environment().temperature_c, 20.0);
        assert_eq!(gw.time_until_next(120_000), 500);
    }
}
