//! Pub/sub client facade.
//!
//! [`ThingsBoardSized`] owns one [`MqttTransport`] and the RPC dispatcher.
//! Sends serialize into a stack buffer of `PAYLOAD` bytes and publish;
//! [`process_events`](ThingsBoardSized::process_events) drives the
//! transport and answers RPC requests synchronously.
//!
//! ```text
//!  send_*  ──▶ serialize ──▶ publish ──▶ v1/devices/me/{telemetry,attributes}
//!
//!  process_events ──▶ poll ──▶ RpcDispatcher ──▶ publish(v1/.../rpc/response/$id)
//! ```
//!
//! A client is single-threaded: boxed RPC handlers are not `Send`, so the
//! instance cannot be shared across threads.

use log::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_FIELDS_AMT, DEFAULT_PAYLOAD, UnknownMethodPolicy};
use crate::error::{Error, Result, RpcError, TransportError};
use crate::json::{Attribute, Data, Telemetry, serialize_fields, serialize_keyval};
use crate::rpc::{RpcCallback, RpcDispatcher};
use crate::topics::{DataKind, RPC_REQUEST_TOPIC_FILTER};

use super::ports::{MqttCredentials, MqttTransport};

/// Client with the default 64-byte payload and 8 field slots.
pub type ThingsBoard<'h, T> = ThingsBoardSized<'h, T, DEFAULT_PAYLOAD, DEFAULT_FIELDS_AMT>;

/// ThingsBoard device client over a pub/sub transport.
///
/// `PAYLOAD` bounds every JSON text in either direction (one byte is
/// reserved), `FIELDS` bounds the fields of one document.
pub struct ThingsBoardSized<'h, T, const PAYLOAD: usize, const FIELDS: usize> {
    transport: T,
    rpc: RpcDispatcher<'h>,
    client_id: heapless::String<32>,
}

impl<'h, T: MqttTransport, const PAYLOAD: usize, const FIELDS: usize>
    ThingsBoardSized<'h, T, PAYLOAD, FIELDS>
{
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            rpc: RpcDispatcher::new(),
            client_id: ClientConfig::default().client_id,
        }
    }

    // ── Connection ────────────────────────────────────────────

    /// Connect to `host:port` authenticating with the device `token`.
    ///
    /// Any RPC subscription is dropped first, even when the connect fails.
    pub fn connect(&mut self, host: &str, token: &str, port: u16) -> Result<()> {
        if host.is_empty() {
            return Err(Error::InvalidArgument("host"));
        }
        if token.is_empty() {
            return Err(Error::InvalidArgument("access token"));
        }

        if let Err(e) = self.unsubscribe_rpc() {
            debug!("TB: unsubscribe before connect: {}", e);
        }

        let credentials = MqttCredentials {
            client_id: &self.client_id,
            username: token,
            password: None,
        };
        info!("TB: connecting to {}:{}", host, port);
        self.transport.connect(host, port, &credentials).map_err(|e| {
            warn!("TB: connect to {}:{} failed: {:?}", host, port, e);
            Error::Transport(TransportError::ConnectFailed)
        })
    }

    /// Connect using `config`, adopting its client id and RPC policy.
    pub fn connect_with(&mut self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        self.client_id.clone_from(&config.client_id);
        self.rpc.set_unknown_method_policy(config.unknown_method);
        self.connect(&config.host, &config.access_token, config.mqtt_port)
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Drive the transport: keep-alive plus delivery of inbound messages.
    /// RPC requests are dispatched and answered before this returns.
    pub fn process_events(&mut self) -> Result<()> {
        let rpc = &mut self.rpc;
        self.transport
            .poll(&mut |transport: &mut T, topic: &str, payload: &[u8]| {
                answer_rpc::<T, PAYLOAD, FIELDS>(rpc, transport, topic, payload);
            })
            .map_err(|e| {
                warn!("TB: event processing failed: {:?}", e);
                Error::Transport(TransportError::PollFailed)
            })
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Send one key/value pair as telemetry.
    pub fn send_telemetry_data<'v>(
        &mut self,
        key: &'v str,
        value: impl Into<Data<'v>>,
    ) -> Result<()> {
        self.send_keyval(DataKind::Telemetry, &Telemetry::new(key, value))
    }

    /// Send several values as one telemetry object.
    pub fn send_telemetry(&mut self, data: &[Telemetry<'_>]) -> Result<()> {
        self.send_data_array(DataKind::Telemetry, data)
    }

    /// Publish caller-encoded JSON verbatim.
    pub fn send_telemetry_json(&mut self, json: &str) -> Result<()> {
        self.send_json(DataKind::Telemetry, json)
    }

    // ── Attributes ────────────────────────────────────────────

    /// Send one key/value pair as a client attribute.
    pub fn send_attribute<'v>(&mut self, key: &'v str, value: impl Into<Data<'v>>) -> Result<()> {
        self.send_keyval(DataKind::Attributes, &Attribute::new(key, value))
    }

    pub fn send_attributes(&mut self, data: &[Attribute<'_>]) -> Result<()> {
        self.send_data_array(DataKind::Attributes, data)
    }

    pub fn send_attribute_json(&mut self, json: &str) -> Result<()> {
        self.send_json(DataKind::Attributes, json)
    }

    // ── Server-side RPC ───────────────────────────────────────

    /// Subscribe to RPC requests and install `callbacks`.
    ///
    /// Fails with `AlreadySubscribed` while a set is active; that set stays
    /// in place.
    pub fn subscribe_rpc(
        &mut self,
        callbacks: impl IntoIterator<Item = RpcCallback<'h>>,
    ) -> Result<()> {
        if self.rpc.is_subscribed() {
            warn!("TB: RPC already subscribed");
            return Err(RpcError::AlreadySubscribed.into());
        }
        self.transport.subscribe(RPC_REQUEST_TOPIC_FILTER).map_err(|e| {
            warn!(
                "TB: subscribe to '{}' failed: {:?}",
                RPC_REQUEST_TOPIC_FILTER, e
            );
            Error::Transport(TransportError::SubscribeFailed)
        })?;
        self.rpc.install(callbacks)
    }

    /// Drop the handler set and unsubscribe. Safe to call repeatedly; the
    /// result is the transport's.
    pub fn unsubscribe_rpc(&mut self) -> Result<()> {
        self.rpc.clear();
        self.transport.unsubscribe(RPC_REQUEST_TOPIC_FILTER).map_err(|e| {
            debug!(
                "TB: unsubscribe from '{}' failed: {:?}",
                RPC_REQUEST_TOPIC_FILTER, e
            );
            Error::Transport(TransportError::UnsubscribeFailed)
        })
    }

    pub fn is_rpc_subscribed(&self) -> bool {
        self.rpc.is_subscribed()
    }

    pub fn set_unknown_method_policy(&mut self, policy: UnknownMethodPolicy) {
        self.rpc.set_unknown_method_policy(policy);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ── Internals ─────────────────────────────────────────────

    fn send_keyval(&mut self, kind: DataKind, value: &Telemetry<'_>) -> Result<()> {
        let mut payload = [0u8; PAYLOAD];
        let len = serialize_keyval(value, &mut payload)?;
        self.publish(kind.mqtt_topic(), &payload[..len])
    }

    fn send_data_array(&mut self, kind: DataKind, data: &[Telemetry<'_>]) -> Result<()> {
        let mut payload = [0u8; PAYLOAD];
        let len = serialize_fields::<FIELDS>(data, &mut payload)?;
        self.publish(kind.mqtt_topic(), &payload[..len])
    }

    fn send_json(&mut self, kind: DataKind, json: &str) -> Result<()> {
        if json.is_empty() {
            return Err(Error::InvalidArgument("json"));
        }
        self.publish(kind.mqtt_topic(), json.as_bytes())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        self.transport.publish(topic, payload).map_err(|e| {
            warn!("TB: publish to '{}' failed: {:?}", topic, e);
            Error::Transport(TransportError::PublishFailed)
        })
    }
}

/// Inbound message hook: dispatch and publish the reply, if any.
fn answer_rpc<T: MqttTransport, const PAYLOAD: usize, const FIELDS: usize>(
    rpc: &mut RpcDispatcher<'_>,
    transport: &mut T,
    topic: &str,
    payload: &[u8],
) {
    if !rpc.is_subscribed() {
        debug!("TB: message on '{}' without RPC subscription", topic);
        return;
    }
    let mut response = [0u8; PAYLOAD];
    match rpc.dispatch(topic, payload, FIELDS, &mut response) {
        Ok(reply) => {
            if let Err(e) = transport.publish(&reply.topic, &response[..reply.len]) {
                warn!("TB: publish to '{}' failed: {:?}", reply.topic, e);
            }
        }
        Err(e) => debug!("TB: no RPC reply for '{}': {}", topic, e),
    }
}
