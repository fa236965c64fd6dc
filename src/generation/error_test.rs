use super::*;
use crate::error::ErrorCode;

#[test]
fn transport_errors_convert() {
    assert_eq!(GenerationError::from(TransportError::Network("dns".into())), GenerationError::Network("dns".into()));
    assert_eq!(
        GenerationError::from(TransportError::HttpClientBuild("tls".into())),
        GenerationError::Network("tls".into())
    );
    assert_eq!(
        GenerationError::from(TransportError::Server { status: 502, body: "bad gateway".into() }),
        GenerationError::Server { status: 502, body: "bad gateway".into() }
    );
    assert_eq!(GenerationError::from(TransportError::Decoding("eof".into())), GenerationError::Decoding("eof".into()));
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(GenerationError::NoMagicInk.error_code(), "E_NO_MAGIC_INK");
    assert_eq!(GenerationError::AlreadyGenerating.error_code(), "E_ALREADY_GENERATING");
    assert_eq!(GenerationError::SnapshotFailed("x".into()).error_code(), "E_SNAPSHOT_FAILED");
    assert_eq!(GenerationError::UnknownCard(uuid::Uuid::nil()).error_code(), "E_UNKNOWN_CARD");
}

#[test]
fn retryable_classification() {
    assert!(GenerationError::Network("x".into()).retryable());
    assert!(GenerationError::Server { status: 500, body: String::new() }.retryable());
    assert!(!GenerationError::Server { status: 422, body: String::new() }.retryable());
    assert!(!GenerationError::NoMagicInk.retryable());
    assert!(!GenerationError::AlreadyGenerating.retryable());
}

#[test]
fn user_messages_mention_status() {
    let msg = GenerationError::Server { status: 503, body: String::new() }.user_message();
    assert!(msg.contains("503"));
    assert!(!GenerationError::NoMagicInk.user_message().is_empty());
}
