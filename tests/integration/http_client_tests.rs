//! Integration tests for the request/response client facade against
//! `MockHttp`.

use tbclient::config::ClientConfig;
use tbclient::error::{Error, SerializeError, TransportError};
use tbclient::{Attribute, Telemetry, ThingsBoardHttp, ThingsBoardHttpSized};

use crate::mock_transport::{HttpCall, MockHttp};

fn client(status: u16) -> ThingsBoardHttp<MockHttp> {
    ThingsBoardHttp::new(MockHttp::new(status), "A1_TEST_TOKEN", "tb.local", 8080).unwrap()
}

#[test]
fn each_send_is_one_connection() {
    let mut tb = client(200);
    tb.send_telemetry_data("temperature", 42).unwrap();

    assert_eq!(
        tb.transport().calls,
        vec![
            HttpCall::Connect {
                host: "tb.local".to_owned(),
                port: 8080,
            },
            HttpCall::Post {
                path: "/api/v1/A1_TEST_TOKEN/telemetry".to_owned(),
                content_type: "application/json".to_owned(),
                body: r#"{"temperature":42}"#.to_owned(),
            },
            HttpCall::Status,
            HttpCall::Close,
        ]
    );
    assert!(!tb.transport().connected);
}

#[test]
fn all_send_forms_hit_the_right_paths() {
    let mut tb = client(200);
    tb.send_telemetry(&[Telemetry::new("a", 1), Telemetry::new("b", 2.5)])
        .unwrap();
    tb.send_telemetry_json(r#"{"raw":1}"#).unwrap();
    tb.send_attribute("fw", "1.2.3").unwrap();
    tb.send_attributes(&[Attribute::new("on", true)]).unwrap();
    tb.send_attribute_json(r#"{"raw":2}"#).unwrap();

    assert_eq!(
        tb.transport().posts(),
        vec![
            ("/api/v1/A1_TEST_TOKEN/telemetry", r#"{"a":1,"b":2.5}"#),
            ("/api/v1/A1_TEST_TOKEN/telemetry", r#"{"raw":1}"#),
            ("/api/v1/A1_TEST_TOKEN/attributes", r#"{"fw":"1.2.3"}"#),
            ("/api/v1/A1_TEST_TOKEN/attributes", r#"{"on":true}"#),
            ("/api/v1/A1_TEST_TOKEN/attributes", r#"{"raw":2}"#),
        ]
    );
    assert_eq!(tb.transport().closes(), 5);
}

#[test]
fn any_2xx_is_success() {
    for status in [200, 201, 204, 299] {
        let mut tb = client(status);
        assert_eq!(tb.send_telemetry_data("t", 1), Ok(()), "status {status}");
    }
}

#[test]
fn non_2xx_fails_and_still_closes() {
    for status in [0, 199, 300, 401, 500] {
        let mut tb = client(status);
        assert_eq!(
            tb.send_telemetry_data("t", 1),
            Err(Error::Transport(TransportError::BadStatus(status)))
        );
        assert_eq!(tb.transport().closes(), 1);
    }
}

#[test]
fn post_failure_still_closes() {
    let mut tb = client(200);
    tb.transport_mut().fail_post = true;
    assert_eq!(
        tb.send_attribute("a", 1),
        Err(Error::Transport(TransportError::PostFailed))
    );
    assert_eq!(tb.transport().closes(), 1);
}

#[test]
fn connect_failure_skips_the_request() {
    let mut tb = client(200);
    tb.transport_mut().fail_connect = true;
    assert_eq!(
        tb.send_telemetry_json("{}"),
        Err(Error::Transport(TransportError::ConnectFailed))
    );
    assert!(tb.transport().posts().is_empty());
    assert_eq!(tb.transport().closes(), 0);
}

#[test]
fn open_connection_is_reused_then_closed() {
    let mut tb = client(200);
    tb.transport_mut().connected = true;
    tb.send_telemetry_data("t", 1).unwrap();
    let is_connect = |c: &HttpCall| matches!(c, HttpCall::Connect { .. });
    assert!(!tb.transport().calls.iter().any(is_connect));
    assert_eq!(tb.transport().closes(), 1);
}

#[test]
fn serializer_errors_never_open_a_connection() {
    let mut tb: ThingsBoardHttpSized<MockHttp, 64, 2> =
        ThingsBoardHttpSized::new(MockHttp::new(200), "tok", "tb.local", 80).unwrap();
    let data = [
        Telemetry::new("a", 1),
        Telemetry::new("b", 2),
        Telemetry::new("c", 3),
    ];
    assert_eq!(
        tb.send_telemetry(&data),
        Err(Error::Serialize(SerializeError::TooManyFields))
    );
    assert!(matches!(
        tb.send_telemetry_json(""),
        Err(Error::InvalidArgument(_))
    ));
    assert!(tb.transport().calls.is_empty());
}

#[test]
fn from_config_uses_the_http_port() {
    let mut cfg = ClientConfig::new("tb.local", "CFG_TOKEN").unwrap();
    cfg.http_port = 9090;
    let mut tb: ThingsBoardHttp<MockHttp> =
        ThingsBoardHttp::from_config(MockHttp::new(200), &cfg).unwrap();
    tb.send_attribute("k", "v").unwrap();
    assert_eq!(
        tb.transport().calls[0],
        HttpCall::Connect {
            host: "tb.local".to_owned(),
            port: 9090,
        }
    );
    assert_eq!(tb.transport().posts()[0].0, "/api/v1/CFG_TOKEN/attributes");
}
