use super::*;
use crate::error::ErrorCode;
use crate::generation::config::GenerationTimeouts;

fn config(api_key: Option<&str>) -> GenerationConfig {
    GenerationConfig {
        endpoint: "https://gen.example.test/generate".into(),
        api_key: api_key.map(str::to_string),
        timeouts: GenerationTimeouts::default(),
    }
}

#[test]
fn parse_success_body() {
    let body = r#"{"generation_id":"g1","actions":[{"type":"place_text","text":"hi"}]}"#;
    let resp = parse_response(200, body).unwrap();
    assert_eq!(resp.generation_id.as_deref(), Some("g1"));
    assert_eq!(resp.actions.len(), 1);
    assert_eq!(resp.actions[0]["type"], "place_text");
}

#[test]
fn parse_accepts_any_2xx() {
    assert!(parse_response(201, r#"{"actions":[]}"#).is_ok());
}

#[test]
fn parse_server_error_keeps_body() {
    let err = parse_response(503, "overloaded").unwrap_err();
    assert_eq!(err, TransportError::Server { status: 503, body: "overloaded".into() });
    assert!(err.retryable());
    assert_eq!(err.error_code(), "E_SERVER");
}

#[test]
fn client_errors_are_not_retryable() {
    let err = parse_response(400, "bad request").unwrap_err();
    assert!(!err.retryable());
}

#[test]
fn parse_invalid_json_is_decoding_error() {
    let err = parse_response(200, "<html>oops</html>").unwrap_err();
    assert!(matches!(err, TransportError::Decoding(_)));
    assert!(!err.retryable());
}

#[test]
fn parse_wrong_shape_is_decoding_error() {
    let err = parse_response(200, r#"{"actions": "nope"}"#).unwrap_err();
    assert!(matches!(err, TransportError::Decoding(_)));
}

#[test]
fn http_transport_builds_with_and_without_key() {
    let plain = HttpTransport::new(&config(None)).unwrap();
    assert_eq!(plain.endpoint(), "https://gen.example.test/generate");
    assert!(plain.auth.is_none());

    let keyed = HttpTransport::new(&config(Some("sk-test"))).unwrap();
    let auth = keyed.auth.unwrap();
    assert!(auth.is_sensitive());
    assert_eq!(auth.to_str().unwrap(), "Bearer sk-test");
}

#[test]
fn http_transport_rejects_unprintable_key() {
    let err = HttpTransport::new(&config(Some("bad\nkey"))).err().unwrap();
    assert!(matches!(err, TransportError::HttpClientBuild(_)));
}
