//! Generation transport: one request, one response.
//!
//! The orchestrator only sees the [`GenerationTransport`] trait; the HTTP
//! client below is the production implementation. Parsing is a pure function
//! so status and body handling are testable without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::{debug, warn};

use super::config::GenerationConfig;
use super::protocol::{GenerationRequest, GenerationResponse};

/// Errors produced while talking to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("request failed: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("server error: status {status}")]
    Server { status: u16, body: String },

    /// The response body was not a valid generation response.
    #[error("response decode failed: {0}")]
    Decoding(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Server { .. } => "E_SERVER",
            Self::Decoding(_) => "E_DECODING",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { status: 429 | 500..=599, .. })
    }
}

/// Sends a generation request and returns the parsed response.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, TransportError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    auth: Option<HeaderValue>,
}

impl HttpTransport {
    /// Build a client for the configured endpoint and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HttpClientBuild`] if the client or the auth header is invalid.
    pub fn new(config: &GenerationConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| TransportError::HttpClientBuild(e.to_string()))?;
        let auth = config
            .api_key
            .as_deref()
            .map(|key| {
                let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| TransportError::HttpClientBuild(e.to_string()))?;
                value.set_sensitive(true);
                Ok(value)
            })
            .transpose()?;
        Ok(Self { http, endpoint: config.endpoint.clone(), auth })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, TransportError> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(auth) = &self.auth {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        debug!(status, body_len = text.len(), "transport: response received");
        parse_response(status, &text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Interpret a raw HTTP status and body.
///
/// # Errors
///
/// Returns [`TransportError::Server`] for non-2xx statuses and
/// [`TransportError::Decoding`] when the body is not a generation response.
pub fn parse_response(status: u16, body: &str) -> Result<GenerationResponse, TransportError> {
    if !(200..300).contains(&status) {
        warn!(status, "transport: generation service returned an error");
        return Err(TransportError::Server { status, body: body.to_string() });
    }
    serde_json::from_str(body).map_err(|e| TransportError::Decoding(e.to_string()))
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
