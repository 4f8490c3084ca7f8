//! Adapters: concrete implementations of the transport ports.
//!
//! | Adapter | Implements      | Connects to                               |
//! |---------|-----------------|-------------------------------------------|
//! | `mqtt`  | `MqttTransport` | ESP-MQTT client / in-memory loopback      |
//! | `http`  | `HttpTransport` | ESP-IDF HTTP client / `std::net` HTTP/1.1 |

pub mod http;
pub mod mqtt;

pub use http::{HttpAdapter, HttpError};
pub use mqtt::{MqttAdapter, MqttError};
