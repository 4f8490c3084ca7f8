//! Bounded JSON layer: typed records, a fixed-capacity document, the
//! outbound serializer and the inbound decoder.

pub mod decode;
pub mod document;
pub mod serializer;
pub mod value;

pub use decode::deserialize_bounded;
pub use document::JsonDocument;
pub use serializer::{serialize_fields, serialize_keyval};
pub use value::{Attribute, Data, RpcResponse, Telemetry};
