//! MQTT transport adapter.
//!
//! Implements [`MqttTransport`] for the pub/sub client.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: wraps the ESP-MQTT client
//!   (`esp_idf_svc::mqtt::client::EspMqttClient`). Broker events arrive on
//!   the ESP-MQTT task and are forwarded through a bounded `embassy-sync`
//!   channel; [`poll`](MqttTransport::poll) drains it on the caller's
//!   thread.
//! - **all other targets**: an in-memory loopback broker. Tests
//!   [`inject`](MqttAdapter::inject) inbound messages and read back what
//!   the client published with
//!   [`take_published`](MqttAdapter::take_published).
//!
//! Inbound messages are copied into fixed-size buffers. Anything longer
//! than [`MAX_INBOUND_PAYLOAD`] or [`MAX_TOPIC_LEN`] is dropped with a
//! warning.

use core::fmt;
use log::{debug, info, warn};

use crate::app::ports::{MqttCredentials, MqttTransport};
use crate::topics::{MAX_TOPIC_LEN, Topic};

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
#[cfg(target_os = "espidf")]
use embassy_sync::channel::Channel;
#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

#[cfg(not(target_os = "espidf"))]
use crate::topics::topic_matches;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Largest inbound payload kept for delivery.
pub const MAX_INBOUND_PAYLOAD: usize = 1024;

/// Inbound messages buffered between two polls.
const INBOUND_DEPTH: usize = 8;

/// Topic filters one connection can hold.
#[cfg(not(target_os = "espidf"))]
const MAX_SUBSCRIPTIONS: usize = 4;

/// How long `connect` waits for the broker's CONNACK.
#[cfg(target_os = "espidf")]
const CONNECT_TIMEOUT_MS: u32 = 10_000;

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqttError {
    /// Operation requires a broker connection.
    NotConnected,
    /// Client creation or handshake failed.
    ConnectFailed,
    /// The broker did not acknowledge the connection in time.
    Timeout,
    Publish,
    Subscribe,
    /// Broker URL or topic does not fit its buffer.
    TooLong,
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to broker"),
            Self::ConnectFailed => write!(f, "broker connection failed"),
            Self::Timeout => write!(f, "broker did not acknowledge in time"),
            Self::Publish => write!(f, "publish rejected"),
            Self::Subscribe => write!(f, "subscription change rejected"),
            Self::TooLong => write!(f, "URL or topic too long"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound message
// ───────────────────────────────────────────────────────────────

/// One message received from the broker, awaiting delivery.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: Topic,
    pub payload: heapless::Vec<u8, MAX_INBOUND_PAYLOAD>,
}

impl InboundMessage {
    /// Copy `topic` and `payload`. `None` when either does not fit.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let topic = Topic::try_from(topic).ok()?;
        let payload = heapless::Vec::from_slice(payload).ok()?;
        Some(Self { topic, payload })
    }
}

/// A message the client published (simulation only).
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[cfg(not(target_os = "espidf"))]
impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        core::str::from_utf8(&self.payload).unwrap_or("<binary>")
    }
}

#[cfg(target_os = "espidf")]
type InboundChannel = Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH>;

// ───────────────────────────────────────────────────────────────
// MqttAdapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    // ── ESP-IDF fields ──────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    inbound: Arc<InboundChannel>,

    // ── Simulation fields ───────────────────────────────────────
    #[cfg(not(target_os = "espidf"))]
    connected: bool,
    #[cfg(not(target_os = "espidf"))]
    reachable: bool,
    #[cfg(not(target_os = "espidf"))]
    broker: Option<(String, u16)>,
    #[cfg(not(target_os = "espidf"))]
    username: String,
    #[cfg(not(target_os = "espidf"))]
    subscriptions: heapless::Vec<Topic, MAX_SUBSCRIPTIONS>,
    #[cfg(not(target_os = "espidf"))]
    inbound: heapless::Deque<InboundMessage, INBOUND_DEPTH>,
    #[cfg(not(target_os = "espidf"))]
    published: Vec<PublishedMessage>,
}

impl Default for MqttAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            inbound: Arc::new(Channel::new()),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            connected: false,
            reachable: true,
            broker: None,
            username: String::new(),
            subscriptions: heapless::Vec::new(),
            inbound: heapless::Deque::new(),
            published: Vec::new(),
        }
    }

    // ── Platform helpers: connect ─────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(
        &mut self,
        host: &str,
        port: u16,
        credentials: &MqttCredentials<'_>,
    ) -> Result<(), MqttError> {
        use core::fmt::Write as _;

        self.platform_disconnect();

        let mut url: heapless::String<96> = heapless::String::new();
        write!(url, "mqtt://{}:{}", host, port).map_err(|_| MqttError::TooLong)?;

        let conf = MqttClientConfiguration {
            client_id: Some(credentials.client_id),
            username: Some(credentials.username),
            password: credentials.password,
            ..Default::default()
        };

        let connected = Arc::clone(&self.connected);
        let inbound = Arc::clone(&self.inbound);
        let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => {
                info!("MQTT(espidf): connected");
                connected.store(true, Ordering::Release);
            }
            EventPayload::Disconnected => {
                warn!("MQTT(espidf): disconnected");
                connected.store(false, Ordering::Release);
            }
            EventPayload::Received {
                topic: Some(topic),
                data,
                details: Details::Complete,
                ..
            } => match InboundMessage::new(topic, data) {
                Some(msg) => {
                    if inbound.try_send(msg).is_err() {
                        warn!("MQTT(espidf): inbound queue full, dropping '{}'", topic);
                    }
                }
                None => warn!("MQTT(espidf): oversized message on '{}' dropped", topic),
            },
            EventPayload::Received { .. } => {
                warn!("MQTT(espidf): chunked message dropped");
            }
            EventPayload::Error(e) => warn!("MQTT(espidf): {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT(espidf): client init failed: {:?}", e);
            MqttError::ConnectFailed
        })?;
        self.client = Some(client);

        let mut waited = 0;
        while !self.connected.load(Ordering::Acquire) {
            if waited >= CONNECT_TIMEOUT_MS {
                warn!("MQTT(espidf): no CONNACK from {} after {} ms", url, waited);
                self.platform_disconnect();
                return Err(MqttError::Timeout);
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
            waited += 50;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(
        &mut self,
        host: &str,
        port: u16,
        credentials: &MqttCredentials<'_>,
    ) -> Result<(), MqttError> {
        self.platform_disconnect();
        if !self.reachable {
            warn!("MQTT(sim): broker {}:{} unreachable", host, port);
            return Err(MqttError::ConnectFailed);
        }
        info!(
            "MQTT(sim): '{}' connected to {}:{}",
            credentials.client_id, host, port
        );
        self.broker = Some((host.to_owned(), port));
        credentials.username.clone_into(&mut self.username);
        self.connected = true;
        Ok(())
    }

    // ── Platform helpers: disconnect ──────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        // Dropping the client stops the ESP-MQTT task.
        if self.client.take().is_some() {
            info!("MQTT(espidf): client stopped");
        }
        self.connected.store(false, Ordering::Release);
        while self.inbound.try_receive().is_ok() {}
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        if self.connected {
            info!("MQTT(sim): disconnected");
        }
        self.connected = false;
        self.subscriptions.clear();
        self.inbound.clear();
    }

    // ── Platform helpers: publish / subscribe ─────────────────

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        let client = self.client.as_mut().ok_or(MqttError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| MqttError::Publish)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        debug!("MQTT(sim): publish {} bytes to '{}'", payload.len(), topic);
        self.published.push(PublishedMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self, filter: &str) -> Result<(), MqttError> {
        let client = self.client.as_mut().ok_or(MqttError::NotConnected)?;
        client
            .subscribe(filter, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| MqttError::Subscribe)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self, filter: &str) -> Result<(), MqttError> {
        if self.subscriptions.iter().any(|s| s == filter) {
            return Ok(());
        }
        let filter = Topic::try_from(filter).map_err(|_| MqttError::TooLong)?;
        self.subscriptions
            .push(filter)
            .map_err(|_| MqttError::Subscribe)
    }

    #[cfg(target_os = "espidf")]
    fn platform_unsubscribe(&mut self, filter: &str) -> Result<(), MqttError> {
        let client = self.client.as_mut().ok_or(MqttError::NotConnected)?;
        client
            .unsubscribe(filter)
            .map(|_| ())
            .map_err(|_| MqttError::Subscribe)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_unsubscribe(&mut self, filter: &str) -> Result<(), MqttError> {
        self.subscriptions.retain(|s| s != filter);
        Ok(())
    }

    // ── Platform helpers: inbound ─────────────────────────────

    #[cfg(target_os = "espidf")]
    fn next_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.try_receive().ok()
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.connected
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation controls
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Deliver `payload` on `topic` as if the broker had sent it.
    ///
    /// Returns `false` when the message is not queued: not connected, no
    /// matching subscription, oversized, or the queue is full.
    pub fn inject(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.connected {
            debug!("MQTT(sim): inject on '{}' while disconnected", topic);
            return false;
        }
        if !self.subscriptions.iter().any(|f| topic_matches(f, topic)) {
            debug!("MQTT(sim): no subscription matches '{}'", topic);
            return false;
        }
        let Some(msg) = InboundMessage::new(topic, payload) else {
            warn!("MQTT(sim): oversized message on '{}' dropped", topic);
            return false;
        };
        if self.inbound.push_back(msg).is_err() {
            warn!("MQTT(sim): inbound queue full, dropping '{}'", topic);
            return false;
        }
        true
    }

    /// Drain everything published since the last call.
    pub fn take_published(&mut self) -> Vec<PublishedMessage> {
        core::mem::take(&mut self.published)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(Topic::as_str)
    }

    /// Make the next `connect` calls fail (or succeed again).
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    /// Simulate the broker dropping the connection.
    pub fn drop_connection(&mut self) {
        self.platform_disconnect();
    }

    /// Broker address and username of the current session.
    pub fn session(&self) -> Option<(&str, u16, &str)> {
        if !self.connected {
            return None;
        }
        let (host, port) = self.broker.as_ref()?;
        Some((host.as_str(), *port, self.username.as_str()))
    }
}

// ───────────────────────────────────────────────────────────────
// MqttTransport implementation
// ───────────────────────────────────────────────────────────────

impl MqttTransport for MqttAdapter {
    type Error = MqttError;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        credentials: &MqttCredentials<'_>,
    ) -> Result<(), MqttError> {
        self.platform_connect(host, port, credentials)
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        if !self.platform_is_connected() {
            return Err(MqttError::NotConnected);
        }
        if topic.len() > MAX_TOPIC_LEN {
            return Err(MqttError::TooLong);
        }
        self.platform_publish(topic, payload)
    }

    fn subscribe(&mut self, filter: &str) -> Result<(), MqttError> {
        if !self.platform_is_connected() {
            return Err(MqttError::NotConnected);
        }
        self.platform_subscribe(filter)
    }

    fn unsubscribe(&mut self, filter: &str) -> Result<(), MqttError> {
        if !self.platform_is_connected() {
            return Err(MqttError::NotConnected);
        }
        self.platform_unsubscribe(filter)
    }

    fn poll(
        &mut self,
        on_message: &mut dyn FnMut(&mut Self, &str, &[u8]),
    ) -> Result<(), MqttError> {
        if !self.platform_is_connected() {
            return Err(MqttError::NotConnected);
        }
        while let Some(msg) = self.next_inbound() {
            on_message(self, msg.topic.as_str(), &msg.payload[..]);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host / simulation path only)
// ───────────────────────────────────────────────────────────────
