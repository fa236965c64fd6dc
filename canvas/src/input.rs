//! Input model: tools, platform-neutral pointer events, and the gesture state machine.
//!
//! Hosts translate their native touch/pen events into [`PointerEvent`]s before
//! handing them to the engine; hardware-specific pen APIs stay in the host.
//! `InputState` is the active gesture being tracked between the first pointer
//! going down and the last one going up, carrying the context needed to
//! compute incremental deltas and to record history when the gesture ends.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::stroke::{Erasure, InkMode};

/// Which tool the user has selected in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Permanent ink (default).
    #[default]
    Pen,
    /// Magic ink sent to the generation service.
    Magic,
    /// Whole-stroke eraser.
    Eraser,
}

impl Tool {
    /// Ink mode for drawing tools; `None` for the eraser.
    #[must_use]
    pub fn ink_mode(self) -> Option<InkMode> {
        match self {
            Self::Pen => Some(InkMode::Pen),
            Self::Magic => Some(InkMode::Magic),
            Self::Eraser => None,
        }
    }
}

/// What produced a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Stylus,
    Finger,
    /// The eraser end of a stylus.
    Eraser,
}

impl ToolType {
    /// Whether this pointer is a pen (either tip).
    #[must_use]
    pub fn is_pen(self) -> bool {
        matches!(self, Self::Stylus | Self::Eraser)
    }
}

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerAction {
    /// First pointer touched down.
    Down,
    /// One or more pointers moved.
    Move,
    /// Last pointer lifted.
    Up,
    /// The platform aborted the gesture.
    Cancel,
    /// An additional pointer touched down.
    PointerDown,
    /// A non-final pointer lifted.
    PointerUp,
}

/// A platform-neutral pointer event in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub action: PointerAction,
    /// Tool of the pointer that triggered this event.
    pub tool: ToolType,
    /// Screen position of the pointer that triggered this event.
    pub position: Point,
    /// Pressure in `[0, 1]`; hosts without pressure report 1.0.
    #[serde(default = "full_pressure")]
    pub pressure: f64,
    /// Screen positions of every pointer still down after this event.
    #[serde(default)]
    pub pointers: Vec<Point>,
}

fn full_pressure() -> f64 {
    1.0
}

impl PointerEvent {
    /// Single-pointer event; `pointers` is derived from `action`.
    #[must_use]
    pub fn single(action: PointerAction, tool: ToolType, position: Point, pressure: f64) -> Self {
        let pointers = match action {
            PointerAction::Up | PointerAction::Cancel => Vec::new(),
            _ => vec![position],
        };
        Self { action, tool, position, pressure, pointers }
    }

    /// Multi-pointer event; `position` is the first listed pointer.
    #[must_use]
    pub fn multi(action: PointerAction, tool: ToolType, pointers: Vec<Point>) -> Self {
        let position = pointers.first().copied().unwrap_or(Point::new(0.0, 0.0));
        Self { action, tool, position, pressure: 1.0, pointers }
    }

    /// Number of pointers still down.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// The first two active pointers, if there are at least two.
    #[must_use]
    pub fn pinch_pair(&self) -> Option<(Point, Point)> {
        match self.pointers.as_slice() {
            [a, b, ..] => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Malformed pointer sequences. Recovered by resetting the gesture to idle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// A finger went down while another gesture was still active.
    #[error("unexpected finger down during {0} gesture")]
    UnexpectedDown(&'static str),
    /// A secondary pointer arrived with no gesture in progress.
    #[error("secondary pointer down with no active gesture")]
    NoActiveGesture,
    /// A pinch event reported fewer than two pointers.
    #[error("pinch requires two pointers, got {0}")]
    PinchPointerMissing(usize),
}

/// Persistent UI state visible to the host.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently selected tool.
    pub tool: Tool,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A pen is laying down ink into the in-progress stroke.
    Drawing,
    /// A pen is erasing strokes.
    Erasing {
        /// Everything removed so far in this gesture, recorded as one history entry on release.
        removed: Erasure,
    },
    /// One finger is panning the canvas.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// Two fingers are zooming (and panning) the canvas.
    Pinching {
        /// Distance between the two pointers at the previous event.
        last_distance: f64,
        /// Screen-space midpoint of the two pointers at the previous event.
        last_center: Point,
    },
}

impl InputState {
    /// Short name for logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Drawing => "drawing",
            Self::Erasing { .. } => "erasing",
            Self::Panning { .. } => "panning",
            Self::Pinching { .. } => "pinching",
        }
    }

    /// Pinch state anchored at the given pointer pair.
    #[must_use]
    pub fn pinch(a: Point, b: Point) -> Self {
        Self::Pinching { last_distance: a.dist(b), last_center: a.midpoint(b) }
    }
}
