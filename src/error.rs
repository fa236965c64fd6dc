//! Shared error conventions.

/// Grepable error code and retryable flag for errors surfaced to the host.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
