//! Fuzz target: `RpcDispatcher::dispatch`
//!
//! Drives arbitrary payloads through the dispatcher with two registered
//! handlers and asserts that every reply fits the 64-byte payload buffer
//! and is valid JSON.
//!
//! cargo fuzz run fuzz_rpc_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use tbclient::json::RpcResponse;
use tbclient::rpc::{RpcCallback, RpcDispatcher};

fuzz_target!(|data: &[u8]| {
    let mut d = RpcDispatcher::new();
    let installed = d.install([
        RpcCallback::new("getTemp", |_| RpcResponse::new("temperature", 21.5)),
        RpcCallback::new("echo", |p| match p.as_str() {
            Some(s) if s.len() < 16 => RpcResponse::new("len", s.len()),
            _ => RpcResponse::none(),
        }),
    ]);
    assert!(installed.is_ok());

    let mut response = [0u8; 64];
    if let Ok(reply) = d.dispatch("v1/devices/me/rpc/request/1", data, 8, &mut response) {
        assert!(reply.len < response.len());
        assert!(serde_json_valid(&response[..reply.len]));
        assert_eq!(reply.topic.as_str(), "v1/devices/me/rpc/response/1");
    }
});

fn serde_json_valid(bytes: &[u8]) -> bool {
    tbclient::json::deserialize_bounded(bytes, usize::MAX).is_ok()
}
