//! Recorded canvas sessions: load, replay through the engine, export.
//!
//! A session file is JSON:
//!
//! ```json
//! {
//!   "viewport": { "width_px": 1024, "height_px": 768 },
//!   "cards": [ ... ],
//!   "steps": [
//!     { "op": "tool", "tool": "magic" },
//!     { "op": "pointer", "action": "down", "tool": "stylus", "position": { "x": 10, "y": 10 } },
//!     { "op": "undo" }
//!   ]
//! }
//! ```

use std::path::Path;

use canvas::camera::Camera;
use canvas::card::Card;
use canvas::engine::EngineCore;
use canvas::input::{PointerEvent, Tool};
use canvas::stroke::Stroke;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read session {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("invalid session JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionViewport {
    pub width_px: f64,
    pub height_px: f64,
}

impl Default for SessionViewport {
    fn default() -> Self {
        Self { width_px: 1024.0, height_px: 768.0 }
    }
}

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionStep {
    Tool { tool: Tool },
    Pointer(PointerEvent),
    Undo,
    Redo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub viewport: SessionViewport,
    /// Cards present before the first step.
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub steps: Vec<SessionStep>,
}

impl Session {
    /// Read and parse a session file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file cannot be read or is not a valid session.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| SessionError::Read { path: path.display().to_string(), source })?;
        Self::parse(&text)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Parse`] if `text` is not a valid session.
    pub fn parse(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build an engine and feed it every step in order.
    ///
    /// Starting cards are loaded outside history, so an `undo` step never
    /// removes them. Cards with a degenerate rect are skipped.
    #[must_use]
    pub fn replay(&self) -> EngineCore {
        let mut core = EngineCore::new();
        core.set_viewport_size(self.viewport.width_px, self.viewport.height_px);
        for card in &self.cards {
            if let Err(e) = core.load_card(card.clone()) {
                warn!(card = %card.id, error = %e, "session: skipping card");
            }
        }
        for (index, step) in self.steps.iter().enumerate() {
            let actions = match step {
                SessionStep::Tool { tool } => {
                    core.set_tool(*tool);
                    Vec::new()
                }
                SessionStep::Pointer(event) => core.on_pointer(event),
                SessionStep::Undo => core.undo(),
                SessionStep::Redo => core.redo(),
            };
            debug!(index, actions = actions.len(), state = core.input_state().name(), "session: step replayed");
        }
        info!(
            steps = self.steps.len(),
            cards = core.cards().len(),
            permanent = core.strokes().permanent().len(),
            magic = core.strokes().magic().len(),
            "session: replay finished"
        );
        core
    }
}

/// Serializable view of an engine's document state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub camera: Camera,
    pub revision: u64,
    pub permanent: Vec<Stroke>,
    pub magic: Vec<Stroke>,
    pub cards: Vec<Card>,
}

impl Document {
    #[must_use]
    pub fn from_engine(core: &EngineCore) -> Self {
        Self {
            camera: core.camera(),
            revision: core.revision(),
            permanent: core.strokes().permanent().to_vec(),
            magic: core.strokes().magic().to_vec(),
            cards: core.cards().cards().to_vec(),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
