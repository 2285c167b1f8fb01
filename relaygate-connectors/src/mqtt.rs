//! MQTT Dashboard Connector
//!
//! ## Overview
//!
//! Mirrors the gateway's dashboard channels onto MQTT topics and brings the
//! actuator trigger back in:
//!
//! ```text
//!          control loop                         background thread
//!   publish_metric / publish_alert             connection.iter()
//!               ↓                                     ↓
//!         client.try_publish ──→ request queue ──→ broker
//!                                                     ↓
//!   poll_trigger ←── mpsc ←── parse ←── {prefix}/v4/set
//! ```
//!
//! The control loop never blocks on the network. When the request queue is
//! full the message is dropped and counted; metrics are re-published every
//! cycle anyway, and alerts are best-effort by nature.
//!
//! ## Reconnection
//!
//! rumqttc reconnects on the next poll after an error. The worker backs off
//! for a second between attempts and re-subscribes to the trigger topic on
//! every new session.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use relaygate_core::events::{AlertKind, VirtualChannel};
use relaygate_core::traits::DashboardSink;
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use serde::Serialize;

use crate::{ConnectionStats, ConnectorError};

/// Request queue depth between the loop and the network thread
const REQUEST_CAPACITY: usize = 32;

/// Delay between reconnect attempts
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// MQTT dashboard configuration
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// MQTT client identifier
    pub client_id: String,
    /// Prefix for every topic
    pub topic_prefix: String,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Optional username and password
    pub credentials: Option<(String, String)>,
    /// Retain metric messages so new subscribers see the last value
    pub retain_metrics: bool,
}

impl MqttConfig {
    /// Create new configuration for a broker
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: "relaygate".into(),
            topic_prefix: "relaygate".into(),
            keep_alive: Duration::from_secs(30),
            credentials: None,
            retain_metrics: true,
        }
    }

    /// Set the client identifier
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set the topic prefix
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Set keep-alive in seconds
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    /// Set username and password
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Set whether metrics are retained
    pub fn retain_metrics(mut self, retain: bool) -> Self {
        self.retain_metrics = retain;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.host.is_empty() {
            return Err(ConnectorError::ConfigError("Broker host is empty".into()));
        }
        if self.client_id.is_empty() {
            return Err(ConnectorError::ConfigError("Client id is empty".into()));
        }
        if self.topic_prefix.contains(['+', '#']) {
            return Err(ConnectorError::ConfigError("Topic prefix contains a wildcard".into()));
        }
        // rumqttc rejects keep-alive below 5 s
        if self.keep_alive < Duration::from_secs(5) {
            return Err(ConnectorError::ConfigError("Keep-alive must be at least 5 s".into()));
        }
        Ok(())
    }

    /// Topic a metric channel is published on
    pub fn metric_topic(&self, channel: VirtualChannel) -> String {
        format!("{}/v{}", self.topic_prefix, channel.number())
    }

    /// Topic an alert is published on
    pub fn alert_topic(&self, kind: AlertKind) -> String {
        format!("{}/alerts/{}", self.topic_prefix, kind.name())
    }

    /// Topic the dashboard writes the actuator trigger to
    pub fn trigger_topic(&self) -> String {
        format!("{}/set", self.metric_topic(VirtualChannel::ActuatorTrigger))
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username, password);
        }
        options
    }
}

/// JSON body of an alert message
#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    event: &'a str,
    message: &'a str,
}

/// Serialize an alert
pub fn alert_payload(kind: AlertKind, message: &str) -> Result<Vec<u8>, ConnectorError> {
    serde_json::to_vec(&AlertPayload { event: kind.name(), message })
        .map_err(|e| ConnectorError::ProtocolError(e.to_string()))
}

/// Parse a trigger write; the dashboard sends the value as text
pub fn parse_trigger(payload: &[u8]) -> Option<i32> {
    std::str::from_utf8(payload).ok()?.trim().parse().ok()
}

/// Dashboard sink publishing over MQTT
pub struct MqttDashboard {
    config: MqttConfig,
    client: Client,
    triggers: Receiver<i32>,
    stats: Arc<Mutex<ConnectionStats>>,
    _worker: JoinHandle<()>,
}

impl MqttDashboard {
    /// Connect to the broker and start the network thread
    ///
    /// Returns once the thread is running; the session itself is established
    /// asynchronously.
    pub fn connect(config: MqttConfig) -> Result<Self, ConnectorError> {
        config.validate()?;

        let (client, connection) = Client::new(config.options(), REQUEST_CAPACITY);
        let (tx, triggers) = mpsc::channel();
        let stats = Arc::new(Mutex::new(ConnectionStats::default()));

        let worker = {
            let client = client.clone();
            let topic = config.trigger_topic();
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name("relaygate-mqtt".into())
                .spawn(move || drive_connection(connection, client, topic, tx, stats))
                .map_err(|e| ConnectorError::Transport(e.to_string()))?
        };

        log::info!("MQTT dashboard connecting to {}:{}", config.host, config.port);
        Ok(Self { config, client, triggers, stats, _worker: worker })
    }

    /// Next actuator trigger value written by the dashboard, if any
    pub fn poll_trigger(&self) -> Option<i32> {
        self.triggers.try_recv().ok()
    }

    /// Configuration in use
    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    /// Snapshot of the connection statistics
    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().map(|stats| stats.clone()).unwrap_or_default()
    }

    fn publish(&mut self, topic: String, retain: bool, payload: Vec<u8>) {
        let len = payload.len();
        let result = self
            .client
            .try_publish(topic, QoS::AtMostOnce, retain, payload)
            .map_err(|_| ConnectorError::QueueFull);

        if let Ok(mut stats) = self.stats.lock() {
            match &result {
                Ok(()) => stats.record_sent(len),
                Err(e) => stats.record_failure(e),
            }
        }
        if let Err(e) = result {
            log::warn!("dashboard message dropped: {}", e);
        }
    }
}

impl DashboardSink for MqttDashboard {
    fn publish_alert(&mut self, kind: AlertKind, message: &str) {
        match alert_payload(kind, message) {
            Ok(payload) => {
                let topic = self.config.alert_topic(kind);
                self.publish(topic, false, payload)
            }
            Err(e) => log::warn!("alert not encoded: {}", e),
        }
    }

    fn publish_metric(&mut self, channel: VirtualChannel, value: f32) {
        let payload = format!("{}", value).into_bytes();
        let topic = self.config.metric_topic(channel);
        let retain = self.config.retain_metrics;
        self.publish(topic, retain, payload);
    }
}

fn drive_connection(
    mut connection: Connection,
    client: Client,
    trigger_topic: String,
    triggers: Sender<i32>,
    stats: Arc<Mutex<ConnectionStats>>,
) {
    for notification in connection.iter() {
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("MQTT session up, subscribing to {}", trigger_topic);
                if let Err(e) = client.try_subscribe(trigger_topic.as_str(), QoS::AtLeastOnce) {
                    log::warn!("trigger subscription failed: {}", e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == trigger_topic => {
                match parse_trigger(&publish.payload) {
                    Some(value) => {
                        if triggers.send(value).is_err() {
                            // Dashboard dropped; stop the worker
                            return;
                        }
                    }
                    None => log::warn!("unparseable trigger payload on {}", publish.topic),
                }
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("MQTT connection error: {}", e);
                if let Ok(mut stats) = stats.lock() {
                    stats.reconnections += 1;
                    stats.last_error = Some(e.to_string());
                }
                thread::sleep(RECONNECT_BACKOFF);
            }
        }
    }
}
