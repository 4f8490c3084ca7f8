//! Port traits: the boundary between the client logic and the network.
//!
//! ```text
//!   ThingsBoard ──▶ MqttTransport ──▶ broker
//!   ThingsBoardHttp ──▶ HttpTransport ──▶ server
//! ```
//!
//! Adapters in [`crate::adapters`] implement these traits; tests plug in
//! hand-written mocks. Every call is blocking and runs on the caller's
//! thread.

use core::fmt::Debug;

// ───────────────────────────────────────────────────────────────
// Pub/sub transport
// ───────────────────────────────────────────────────────────────

/// Credentials presented on the MQTT connect handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MqttCredentials<'a> {
    pub client_id: &'a str,
    /// The device access token.
    pub username: &'a str,
    pub password: Option<&'a str>,
}

/// MQTT-style publish/subscribe transport.
pub trait MqttTransport {
    type Error: Debug;

    /// Connect to `host:port` and complete the handshake.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        credentials: &MqttCredentials<'_>,
    ) -> Result<(), Self::Error>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    fn subscribe(&mut self, filter: &str) -> Result<(), Self::Error>;

    fn unsubscribe(&mut self, filter: &str) -> Result<(), Self::Error>;

    /// Drive keep-alive and deliver every pending inbound message.
    ///
    /// Each message is handed to `on_message` together with the transport
    /// itself, so the callback can publish a reply before the next message
    /// is delivered.
    fn poll(
        &mut self,
        on_message: &mut dyn FnMut(&mut Self, &str, &[u8]),
    ) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Request/response transport
// ───────────────────────────────────────────────────────────────

/// HTTP-style request/response transport. One request per connection.
pub trait HttpTransport {
    type Error: Debug;

    fn connect(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;

    fn is_connected(&self) -> bool;

    /// Send a POST with `body` to `path`.
    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<(), Self::Error>;

    /// Status code of the last response.
    fn response_status_code(&mut self) -> Result<u16, Self::Error>;

    fn close(&mut self);
}
