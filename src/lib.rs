//! ThingsBoard device client.
//!
//! Reports telemetry and attributes to a ThingsBoard server and answers
//! server-side RPC requests, inside fixed-size payload buffers.
//!
//! - [`json`]: typed records and the bounded serializer/decoder.
//! - [`rpc`]: handler registry and request dispatch.
//! - [`app`]: the client facades and the transport ports they drive.
//! - [`adapters`]: MQTT and HTTP transports (ESP-IDF or host simulation,
//!   chosen by `#[cfg(target_os = "espidf")]` inside each module).

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod json;
pub mod rpc;
pub mod topics;

pub use app::{ThingsBoard, ThingsBoardHttp, ThingsBoardHttpSized, ThingsBoardSized};
pub use error::{Error, Result};
pub use json::{Attribute, RpcResponse, Telemetry};
pub use rpc::{RpcCallback, RpcData};
