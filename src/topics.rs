//! Destination names of the ThingsBoard device API.
//!
//! | Destination                     | Direction | Transport |
//! |---------------------------------|-----------|-----------|
//! | `v1/devices/me/telemetry`       | out       | MQTT      |
//! | `v1/devices/me/attributes`      | out       | MQTT      |
//! | `v1/devices/me/rpc/request/+`   | in        | MQTT      |
//! | `v1/devices/me/rpc/response/$id`| out       | MQTT      |
//! | `/api/v1/$token/telemetry`      | out       | HTTP      |
//! | `/api/v1/$token/attributes`     | out       | HTTP      |

use core::fmt::Write;

use crate::error::{Error, Result, RpcError};

pub const TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";
pub const ATTRIBUTES_TOPIC: &str = "v1/devices/me/attributes";
pub const RPC_REQUEST_TOPIC_FILTER: &str = "v1/devices/me/rpc/request/+";
pub const RPC_REQUEST_PREFIX: &str = "v1/devices/me/rpc/request/";

/// Longest topic the client will build or accept.
pub const MAX_TOPIC_LEN: usize = 128;
/// Longest HTTP API path (`/api/v1/` + 64-byte token + `/attributes`).
pub const MAX_PATH_LEN: usize = 96;

pub type Topic = heapless::String<MAX_TOPIC_LEN>;

/// Which kind of data a send carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Telemetry,
    Attributes,
}

impl DataKind {
    pub const fn mqtt_topic(self) -> &'static str {
        match self {
            Self::Telemetry => TELEMETRY_TOPIC,
            Self::Attributes => ATTRIBUTES_TOPIC,
        }
    }

    const fn path_suffix(self) -> &'static str {
        match self {
            Self::Telemetry => "telemetry",
            Self::Attributes => "attributes",
        }
    }
}

/// True when `topic` is addressed to the RPC request channel.
pub fn is_rpc_request(topic: &str) -> bool {
    topic
        .strip_prefix(RPC_REQUEST_PREFIX)
        .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

/// Derive the response topic by replacing the first `request` segment
/// with `response`.
pub fn response_topic(request: &str) -> Result<Topic> {
    let Some(at) = request.find("request") else {
        return Err(RpcError::UnexpectedTopic.into());
    };

    let mut out = Topic::new();
    out.push_str(&request[..at])
        .and_then(|()| out.push_str("response"))
        .and_then(|()| out.push_str(&request[at + "request".len()..]))
        .map_err(|_| Error::Rpc(RpcError::TopicTooLong))?;
    Ok(out)
}

/// MQTT topic filter matching (`+` one level, `#` the remainder).
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut levels = topic.split('/');
    for f in filter.split('/') {
        match (f, levels.next()) {
            ("#", _) => return true,
            ("+", Some(_)) => {}
            (f, Some(t)) if f == t => {}
            _ => return false,
        }
    }
    levels.next().is_none()
}

/// HTTP API path for `kind` under the device `token`.
pub fn http_path(token: &str, kind: DataKind) -> Result<heapless::String<MAX_PATH_LEN>> {
    let mut path = heapless::String::new();
    write!(path, "/api/v1/{}/{}", token, kind.path_suffix())
        .map_err(|_| Error::InvalidArgument("access token too long"))?;
    Ok(path)
}
