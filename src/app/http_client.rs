//! Request/response client facade.
//!
//! Each send opens a connection when needed, posts one JSON body to
//! `/api/v1/$token/{telemetry,attributes}` and closes the connection again.
//! There is no RPC here: the server cannot push over this transport.

use log::{debug, warn};

use crate::config::{ClientConfig, DEFAULT_FIELDS_AMT, DEFAULT_PAYLOAD};
use crate::error::{Error, Result, TransportError};
use crate::json::{Attribute, Data, Telemetry, serialize_fields, serialize_keyval};
use crate::topics::{self, DataKind};

use super::ports::HttpTransport;

const CONTENT_TYPE: &str = "application/json";

/// HTTP client with the default 64-byte payload and 8 field slots.
pub type ThingsBoardHttp<T> = ThingsBoardHttpSized<T, DEFAULT_PAYLOAD, DEFAULT_FIELDS_AMT>;

pub struct ThingsBoardHttpSized<T, const PAYLOAD: usize, const FIELDS: usize> {
    transport: T,
    host: heapless::String<64>,
    token: heapless::String<64>,
    port: u16,
}

impl<T: HttpTransport, const PAYLOAD: usize, const FIELDS: usize>
    ThingsBoardHttpSized<T, PAYLOAD, FIELDS>
{
    pub fn new(transport: T, access_token: &str, host: &str, port: u16) -> Result<Self> {
        if host.is_empty() {
            return Err(Error::InvalidArgument("host"));
        }
        if access_token.is_empty() {
            return Err(Error::InvalidArgument("access token"));
        }
        Ok(Self {
            transport,
            host: heapless::String::try_from(host)
                .map_err(|_| Error::InvalidArgument("host too long"))?,
            token: heapless::String::try_from(access_token)
                .map_err(|_| Error::InvalidArgument("access token too long"))?,
            port,
        })
    }

    pub fn from_config(transport: T, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            transport,
            &config.access_token,
            &config.host,
            config.http_port,
        )
    }

    pub fn send_telemetry_data<'v>(
        &mut self,
        key: &'v str,
        value: impl Into<Data<'v>>,
    ) -> Result<()> {
        self.send_keyval(DataKind::Telemetry, &Telemetry::new(key, value))
    }

    pub fn send_telemetry(&mut self, data: &[Telemetry<'_>]) -> Result<()> {
        self.send_data_array(DataKind::Telemetry, data)
    }

    pub fn send_telemetry_json(&mut self, json: &str) -> Result<()> {
        self.send_json(DataKind::Telemetry, json)
    }

    pub fn send_attribute<'v>(&mut self, key: &'v str, value: impl Into<Data<'v>>) -> Result<()> {
        self.send_keyval(DataKind::Attributes, &Attribute::new(key, value))
    }

    pub fn send_attributes(&mut self, data: &[Attribute<'_>]) -> Result<()> {
        self.send_data_array(DataKind::Attributes, data)
    }

    pub fn send_attribute_json(&mut self, json: &str) -> Result<()> {
        self.send_json(DataKind::Attributes, json)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn send_keyval(&mut self, kind: DataKind, value: &Telemetry<'_>) -> Result<()> {
        let mut payload = [0u8; PAYLOAD];
        let len = serialize_keyval(value, &mut payload)?;
        self.post_message(kind, &payload[..len])
    }

    fn send_data_array(&mut self, kind: DataKind, data: &[Telemetry<'_>]) -> Result<()> {
        let mut payload = [0u8; PAYLOAD];
        let len = serialize_fields::<FIELDS>(data, &mut payload)?;
        self.post_message(kind, &payload[..len])
    }

    fn send_json(&mut self, kind: DataKind, json: &str) -> Result<()> {
        if json.is_empty() {
            return Err(Error::InvalidArgument("json"));
        }
        self.post_message(kind, json.as_bytes())
    }

    /// One request, then close, whatever the outcome.
    fn post_message(&mut self, kind: DataKind, body: &[u8]) -> Result<()> {
        let path = topics::http_path(&self.token, kind)?;

        if !self.transport.is_connected() {
            if let Err(e) = self.transport.connect(&self.host, self.port) {
                warn!(
                    "HTTP: connect to {}:{} failed: {:?}",
                    self.host, self.port, e
                );
                return Err(TransportError::ConnectFailed.into());
            }
        }

        let result = self.post_and_check(&path, body);
        self.transport.close();
        result
    }

    fn post_and_check(&mut self, path: &str, body: &[u8]) -> Result<()> {
        self.transport.post(path, CONTENT_TYPE, body).map_err(|e| {
            warn!("HTTP: POST {} failed: {:?}", path, e);
            Error::Transport(TransportError::PostFailed)
        })?;

        let status = self.transport.response_status_code().map_err(|e| {
            warn!("HTTP: no response to POST {}: {:?}", path, e);
            Error::Transport(TransportError::PostFailed)
        })?;
        if !(200..300).contains(&status) {
            warn!("HTTP: POST {} answered {}", path, status);
            return Err(TransportError::BadStatus(status).into());
        }
        debug!("HTTP: POST {} -> {}", path, status);
        Ok(())
    }
}
