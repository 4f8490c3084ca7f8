//! Integration tests for the pub/sub client facade against `MockMqtt`.
//!
//! Cover the connect handshake, the telemetry/attribute send paths and the
//! RPC subscription state machine (subscribe / unsubscribe / reconnect).

use std::cell::{Cell, RefCell};

use tbclient::config::{ClientConfig, UnknownMethodPolicy};
use tbclient::error::{Error, RpcError, SerializeError, TransportError};
use tbclient::topics::{ATTRIBUTES_TOPIC, RPC_REQUEST_TOPIC_FILTER, TELEMETRY_TOPIC};
use tbclient::{
    Attribute, RpcCallback, RpcData, RpcResponse, Telemetry, ThingsBoard, ThingsBoardSized,
};

use crate::mock_transport::{MockMqtt, MqttCall};

const REQUEST_7: &str = "v1/devices/me/rpc/request/7";
const RESPONSE_7: &str = "v1/devices/me/rpc/response/7";

fn connected_client<'h>() -> ThingsBoard<'h, MockMqtt> {
    let mut tb = ThingsBoard::new(MockMqtt::new());
    tb.connect("tb.local", "A1_TEST_TOKEN", 1883).unwrap();
    tb.transport_mut().clear_calls();
    tb
}

// ── Connect ───────────────────────────────────────────────────

#[test]
fn connect_clears_rpc_then_authenticates_with_token() {
    let mut tb: ThingsBoard<'_, MockMqtt> = ThingsBoard::new(MockMqtt::new());
    tb.connect("tb.local", "A1_TEST_TOKEN", 1883).unwrap();

    assert!(tb.is_connected());
    assert_eq!(
        tb.transport().calls,
        vec![
            MqttCall::Unsubscribe(RPC_REQUEST_TOPIC_FILTER.to_owned()),
            MqttCall::Connect {
                host: "tb.local".to_owned(),
                port: 1883,
                client_id: "TbDev".to_owned(),
                username: "A1_TEST_TOKEN".to_owned(),
                password: None,
            },
        ]
    );
}

#[test]
fn connect_rejects_empty_arguments_without_touching_transport() {
    let mut tb: ThingsBoard<'_, MockMqtt> = ThingsBoard::new(MockMqtt::new());
    assert!(matches!(
        tb.connect("", "tok", 1883),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        tb.connect("tb.local", "", 1883),
        Err(Error::InvalidArgument(_))
    ));
    assert!(tb.transport().calls.is_empty());
}

#[test]
fn failed_connect_is_reported_and_still_drops_rpc() {
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("m", |_| RpcResponse::none())])
        .unwrap();

    tb.transport_mut().fail_connect = true;
    tb.transport_mut().connected = false;
    assert_eq!(
        tb.connect("tb.local", "tok", 1883),
        Err(Error::Transport(TransportError::ConnectFailed))
    );
    assert!(!tb.is_rpc_subscribed());
}

#[test]
fn connect_with_uses_config_fields() {
    let mut cfg = ClientConfig::new("broker.example", "CFG_TOKEN").unwrap();
    cfg.mqtt_port = 8883;
    cfg.client_id = heapless::String::try_from("gateway-1").unwrap();

    let mut tb: ThingsBoard<'_, MockMqtt> = ThingsBoard::new(MockMqtt::new());
    tb.connect_with(&cfg).unwrap();

    assert!(tb.transport().calls.contains(&MqttCall::Connect {
        host: "broker.example".to_owned(),
        port: 8883,
        client_id: "gateway-1".to_owned(),
        username: "CFG_TOKEN".to_owned(),
        password: None,
    }));
}

#[test]
fn connect_with_rejects_invalid_config() {
    let mut tb: ThingsBoard<'_, MockMqtt> = ThingsBoard::new(MockMqtt::new());
    assert!(matches!(
        tb.connect_with(&ClientConfig::default()),
        Err(Error::Config(_))
    ));
    assert!(tb.transport().calls.is_empty());
}

#[test]
fn disconnect_passes_through() {
    let mut tb = connected_client();
    tb.disconnect();
    assert!(!tb.is_connected());
    assert_eq!(tb.transport().calls, vec![MqttCall::Disconnect]);
}

// ── Sends ─────────────────────────────────────────────────────

#[test]
fn single_values_go_to_their_topics() {
    let mut tb = connected_client();
    tb.send_telemetry_data("temperature", 42).unwrap();
    tb.send_telemetry_data("humidity", 55.5).unwrap();
    tb.send_attribute("active", true).unwrap();
    tb.send_attribute("mode", "eco").unwrap();

    assert_eq!(
        tb.transport().publishes(),
        vec![
            (TELEMETRY_TOPIC, r#"{"temperature":42}"#),
            (TELEMETRY_TOPIC, r#"{"humidity":55.5}"#),
            (ATTRIBUTES_TOPIC, r#"{"active":true}"#),
            (ATTRIBUTES_TOPIC, r#"{"mode":"eco"}"#),
        ]
    );
}

#[test]
fn aggregate_sends_build_one_object() {
    let mut tb = connected_client();
    tb.send_telemetry(&[Telemetry::new("a", 1), Telemetry::new("b", false)])
        .unwrap();
    tb.send_attributes(&[Attribute::new("fw", "1.0"), Attribute::new("rev", 3)])
        .unwrap();

    assert_eq!(
        tb.transport().publishes(),
        vec![
            (TELEMETRY_TOPIC, r#"{"a":1,"b":false}"#),
            (ATTRIBUTES_TOPIC, r#"{"fw":"1.0","rev":3}"#),
        ]
    );
}

#[test]
fn json_sends_are_published_verbatim() {
    let mut tb = connected_client();
    let big = format!(r#"{{"blob":"{}"}}"#, "x".repeat(200));
    tb.send_telemetry_json(&big).unwrap();
    tb.send_attribute_json("not even json").unwrap();

    let published = tb.transport().publishes();
    assert_eq!(published[0], (TELEMETRY_TOPIC, big.as_str()));
    assert_eq!(published[1], (ATTRIBUTES_TOPIC, "not even json"));
}

#[test]
fn too_many_fields_publishes_nothing() {
    let mut tb = connected_client();
    let keys = ["k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7", "k8"];
    let data: Vec<Telemetry<'_>> = keys.iter().map(|k| Telemetry::new(k, 1)).collect();

    assert_eq!(
        tb.send_telemetry(&data),
        Err(Error::Serialize(SerializeError::TooManyFields))
    );
    assert!(tb.transport().publishes().is_empty());
    tb.send_telemetry(&data[..8]).unwrap();
}

#[test]
fn payload_bound_applies_to_sends() {
    let mut tb: ThingsBoardSized<'_, MockMqtt, 16, 8> = ThingsBoardSized::new(MockMqtt::new());
    tb.connect("tb.local", "tok", 1883).unwrap();

    // {"abc":"defghi"} is 16 bytes: one over the 15-byte limit.
    assert_eq!(
        tb.send_telemetry_data("abc", "defghi"),
        Err(Error::Serialize(SerializeError::BufferTooSmall))
    );
    tb.send_telemetry_data("abc", "defgh").unwrap();
    assert_eq!(
        tb.transport().publishes(),
        vec![(TELEMETRY_TOPIC, r#"{"abc":"defgh"}"#)]
    );
}

#[test]
fn empty_json_is_invalid() {
    let mut tb = connected_client();
    assert!(matches!(
        tb.send_telemetry_json(""),
        Err(Error::InvalidArgument(_))
    ));
    assert!(tb.transport().calls.is_empty());
}

#[test]
fn publish_failure_is_reported() {
    let mut tb = connected_client();
    tb.transport_mut().fail_publish = true;
    assert_eq!(
        tb.send_telemetry_data("t", 1),
        Err(Error::Transport(TransportError::PublishFailed))
    );
}

// ── RPC subscription state machine ────────────────────────────

#[test]
fn subscribe_twice_keeps_the_original_handlers() {
    let first = Cell::new(0);
    let second = Cell::new(0);
    let mut tb = connected_client();

    tb.subscribe_rpc([RpcCallback::new("m", |_| {
        first.set(first.get() + 1);
        RpcResponse::anonymous(1)
    })])
    .unwrap();
    assert_eq!(
        tb.subscribe_rpc([RpcCallback::new("m", |_| {
            second.set(second.get() + 1);
            RpcResponse::anonymous(2)
        })]),
        Err(Error::Rpc(RpcError::AlreadySubscribed))
    );
    assert!(tb.is_rpc_subscribed());

    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"m"}"#);
    tb.process_events().unwrap();

    assert_eq!((first.get(), second.get()), (1, 0));
    assert_eq!(tb.transport().publishes(), vec![(RESPONSE_7, "1")]);
    assert_eq!(
        tb.transport().count(|c| matches!(c, MqttCall::Subscribe(_))),
        1
    );
}

#[test]
fn unsubscribe_is_idempotent() {
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("m", |_| RpcResponse::none())])
        .unwrap();

    tb.unsubscribe_rpc().unwrap();
    assert!(!tb.is_rpc_subscribed());
    tb.unsubscribe_rpc().unwrap();
    assert!(!tb.is_rpc_subscribed());
    assert_eq!(
        tb.transport().count(|c| matches!(c, MqttCall::Unsubscribe(_))),
        2
    );

    // Subscribing again is allowed once the old set is gone.
    tb.subscribe_rpc([RpcCallback::new("m", |_| RpcResponse::none())])
        .unwrap();
}

#[test]
fn unsubscribe_reports_transport_result_but_always_clears() {
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("m", |_| RpcResponse::none())])
        .unwrap();
    tb.transport_mut().fail_unsubscribe = true;

    assert_eq!(
        tb.unsubscribe_rpc(),
        Err(Error::Transport(TransportError::UnsubscribeFailed))
    );
    assert!(!tb.is_rpc_subscribed());
}

#[test]
fn failed_transport_subscribe_installs_nothing() {
    let mut tb = connected_client();
    tb.transport_mut().fail_subscribe = true;
    assert_eq!(
        tb.subscribe_rpc([RpcCallback::new("m", |_| RpcResponse::none())]),
        Err(Error::Transport(TransportError::SubscribeFailed))
    );
    assert!(!tb.is_rpc_subscribed());
}

#[test]
fn reconnect_drops_the_handler_set() {
    let calls = Cell::new(0);
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("m", |_| {
        calls.set(calls.get() + 1);
        RpcResponse::none()
    })])
    .unwrap();

    tb.connect("tb.local", "A1_TEST_TOKEN", 1883).unwrap();
    assert!(!tb.is_rpc_subscribed());

    tb.transport_mut().clear_calls();
    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"m"}"#);
    tb.process_events().unwrap();
    assert_eq!(calls.get(), 0);
    assert!(tb.transport().publishes().is_empty());
}

// ── RPC dispatch through process_events ───────────────────────

#[test]
fn set_led_is_dispatched_with_its_params() {
    let seen = RefCell::new(Vec::new());
    let mut tb = connected_client();
    tb.subscribe_rpc([
        RpcCallback::new("getTemp", |p: &RpcData| {
            seen.borrow_mut().push(("getTemp", p.clone()));
            RpcResponse::new("temperature", 22.5)
        }),
        RpcCallback::new("setLed", |p: &RpcData| {
            seen.borrow_mut().push(("setLed", p.clone()));
            RpcResponse::new("state", true)
        }),
    ])
    .unwrap();
    tb.transport_mut().clear_calls();

    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"setLed","params":{"state":true}}"#);
    tb.process_events().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![("setLed", serde_json::json!({"state": true}))]
    );
    assert_eq!(
        tb.transport().publishes(),
        vec![(RESPONSE_7, r#"{"state":true}"#)]
    );
}

#[test]
fn missing_method_publishes_nothing() {
    let invoked = Cell::new(false);
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("getTemp", |_| {
        invoked.set(true);
        RpcResponse::anonymous(1)
    })])
    .unwrap();
    tb.transport_mut().clear_calls();

    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"params":{}}"#);
    tb.process_events().unwrap();

    assert!(!invoked.get());
    assert!(tb.transport().publishes().is_empty());
}

#[test]
fn unknown_method_reply_follows_policy() {
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("getTemp", |_| RpcResponse::anonymous(1))])
        .unwrap();
    tb.transport_mut().clear_calls();

    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"reboot"}"#);
    tb.process_events().unwrap();
    assert_eq!(tb.transport().publishes(), vec![(RESPONSE_7, "null")]);

    tb.set_unknown_method_policy(UnknownMethodPolicy::Suppress);
    tb.transport_mut().clear_calls();
    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"reboot"}"#);
    tb.process_events().unwrap();
    assert!(tb.transport().publishes().is_empty());
}

#[test]
fn several_requests_are_answered_in_order() {
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("echo", |p: &RpcData| {
        RpcResponse::anonymous(p.as_i64().unwrap_or(-1))
    })])
    .unwrap();
    tb.transport_mut().clear_calls();

    tb.transport_mut().push_inbound(
        "v1/devices/me/rpc/request/1",
        r#"{"method":"echo","params":10}"#,
    );
    tb.transport_mut()
        .push_inbound("v1/devices/me/rpc/request/2", r#"{"method":"echo"}"#);
    tb.process_events().unwrap();

    assert_eq!(
        tb.transport().publishes(),
        vec![
            ("v1/devices/me/rpc/response/1", "10"),
            ("v1/devices/me/rpc/response/2", "-1"),
        ]
    );
}

#[test]
fn oversized_or_malformed_requests_are_dropped() {
    let invoked = Cell::new(0);
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("m", |_| {
        invoked.set(invoked.get() + 1);
        RpcResponse::anonymous(1)
    })])
    .unwrap();
    tb.transport_mut().clear_calls();

    let long = format!(r#"{{"method":"m","params":"{}"}}"#, "p".repeat(64));
    tb.transport_mut().push_inbound(REQUEST_7, &long);
    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"m""#);
    tb.transport_mut()
        .push_inbound(REQUEST_7, r#"{"method":"m","params":[1,2,3,4,5,6,7]}"#);
    tb.process_events().unwrap();

    assert_eq!(invoked.get(), 0);
    assert!(tb.transport().publishes().is_empty());
}

#[test]
fn messages_on_other_topics_are_ignored() {
    let invoked = Cell::new(false);
    let mut tb = connected_client();
    tb.subscribe_rpc([RpcCallback::new("m", |_| {
        invoked.set(true);
        RpcResponse::none()
    })])
    .unwrap();
    tb.transport_mut().clear_calls();

    tb.transport_mut()
        .push_inbound(ATTRIBUTES_TOPIC, r#"{"method":"m"}"#);
    tb.process_events().unwrap();

    assert!(!invoked.get());
    assert!(tb.transport().publishes().is_empty());
}
