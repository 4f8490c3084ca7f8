//! Client configuration parameters
//!
//! Compile-time defaults for buffer sizing and ports, plus the runtime
//! [`ClientConfig`] describing which server to talk to and how.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default payload buffer size in bytes (one byte is reserved).
pub const DEFAULT_PAYLOAD: usize = 64;
/// Default number of JSON field slots per document.
pub const DEFAULT_FIELDS_AMT: usize = 8;
/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;
/// Default HTTP API port.
pub const DEFAULT_HTTP_PORT: u16 = 80;
/// MQTT client identifier presented to the broker.
pub const DEFAULT_CLIENT_ID: &str = "TbDev";

/// What the dispatcher does when no handler matches an RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnknownMethodPolicy {
    /// Publish a `null` response so the server sees the request answered.
    #[default]
    ReplyNull,
    /// Publish nothing.
    Suppress,
}

/// Connection settings for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: heapless::String<64>,
    /// Device access token (MQTT username / HTTP path segment).
    pub access_token: heapless::String<64>,
    pub mqtt_port: u16,
    pub http_port: u16,
    /// MQTT client identifier.
    pub client_id: heapless::String<32>,
    pub unknown_method: UnknownMethodPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut client_id = heapless::String::new();
        // DEFAULT_CLIENT_ID is 5 bytes, always fits.
        let _ = client_id.push_str(DEFAULT_CLIENT_ID);
        Self {
            host: heapless::String::new(),
            access_token: heapless::String::new(),
            mqtt_port: DEFAULT_MQTT_PORT,
            http_port: DEFAULT_HTTP_PORT,
            client_id,
            unknown_method: UnknownMethodPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config for `host` authenticated by `access_token`, all other
    /// fields at their defaults.
    pub fn new(host: &str, access_token: &str) -> Result<Self> {
        let cfg = Self {
            host: heapless::String::try_from(host).map_err(|_| Error::Config("host too long"))?,
            access_token: heapless::String::try_from(access_token)
                .map_err(|_| Error::Config("access token too long"))?,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configs the client could never connect with.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty"));
        }
        if self.access_token.is_empty() {
            return Err(Error::Config("access token must not be empty"));
        }
        if self.client_id.is_empty() {
            return Err(Error::Config("client id must not be empty"));
        }
        if self.mqtt_port == 0 || self.http_port == 0 {
            return Err(Error::Config("ports must be non-zero"));
        }
        Ok(())
    }
}
