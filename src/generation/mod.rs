//! Generation: magic ink to cards through a remote service.
//!
//! | Module | Role |
//! |--------|------|
//! | [`protocol`] | Request/response JSON, asset descriptors, action decoding |
//! | [`orchestrator`] | `play`: prepare, snapshot, send, apply |
//! | [`transport`] | Transport trait and the `reqwest` client |
//! | [`snapshot`] | Snapshot provider trait and the file-backed provider |
//! | [`config`] | Endpoint and timeout configuration from the environment |

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod snapshot;
pub mod transport;

pub use config::GenerationConfig;
pub use error::GenerationError;
pub use orchestrator::{Orchestrator, PlayReport, Scope, SkippedAction};
pub use snapshot::{FileSnapshot, SnapshotProvider, SnapshotRegion};
pub use transport::{GenerationTransport, HttpTransport, TransportError};
