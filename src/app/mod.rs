//! Client facades and the transport ports they drive.
//!
//! The facades hold no I/O of their own: every network interaction goes
//! through the traits in [`ports`], so the whole client runs against mock
//! transports in tests.

pub mod client;
pub mod http_client;
pub mod ports;

pub use client::{ThingsBoard, ThingsBoardSized};
pub use http_client::{ThingsBoardHttp, ThingsBoardHttpSized};
pub use ports::{HttpTransport, MqttCredentials, MqttTransport};
