//! Server-side RPC: handler registration and request dispatch.
//!
//! ```text
//! v1/devices/me/rpc/request/$id ──▶ RpcDispatcher ──▶ handler(params)
//!                                        │
//! v1/devices/me/rpc/response/$id ◀── serialize_keyval(result)
//! ```

pub mod callback;
pub mod dispatcher;

pub use callback::{RpcCallback, RpcData};
pub use dispatcher::{RpcDispatcher, RpcReply};
