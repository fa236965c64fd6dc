//! Errors returned by [`super::Orchestrator::play`].

use canvas::card::CardId;
use canvas::geometry::GeometryError;

use super::transport::TransportError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("no magic ink to generate from")]
    NoMagicInk,

    #[error("a generation is already in flight")]
    AlreadyGenerating,

    #[error("snapshot failed: {0}")]
    SnapshotFailed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error: status {status}")]
    Server { status: u16, body: String },

    #[error("response decode failed: {0}")]
    Decoding(String),

    #[error("card {0} not found")]
    UnknownCard(CardId),

    #[error("cannot generate: {0}")]
    Geometry(#[from] GeometryError),
}

impl GenerationError {
    /// Short message suitable for showing to the person drawing.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoMagicInk => "Draw with magic ink first, then press play.".into(),
            Self::AlreadyGenerating => "Still working on the last one.".into(),
            Self::SnapshotFailed(_) => "Couldn't capture the canvas. Try again.".into(),
            Self::Network(_) => "Couldn't reach the generation service. Check your connection.".into(),
            Self::Server { status, .. } => format!("The generation service failed (status {status})."),
            Self::Decoding(_) => "The generation service sent something unexpected.".into(),
            Self::UnknownCard(_) => "That card no longer exists.".into(),
            Self::Geometry(_) => "The canvas has no visible area.".into(),
        }
    }
}

impl crate::error::ErrorCode for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoMagicInk => "E_NO_MAGIC_INK",
            Self::AlreadyGenerating => "E_ALREADY_GENERATING",
            Self::SnapshotFailed(_) => "E_SNAPSHOT_FAILED",
            Self::Network(_) => "E_NETWORK",
            Self::Server { .. } => "E_SERVER",
            Self::Decoding(_) => "E_DECODING",
            Self::UnknownCard(_) => "E_UNKNOWN_CARD",
            Self::Geometry(_) => "E_DEGENERATE_VIEWPORT",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::SnapshotFailed(_) | Self::Network(_) | Self::Server { status: 429 | 500..=599, .. })
    }
}

impl From<TransportError> for GenerationError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Network(msg) | TransportError::HttpClientBuild(msg) => Self::Network(msg),
            TransportError::Server { status, body } => Self::Server { status, body },
            TransportError::Decoding(msg) => Self::Decoding(msg),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
