//! Interaction and history engine for the magic ink canvas.
//!
//! This crate owns the synchronous core of the canvas: translating raw
//! multi-pointer events into ink, erasures and pan/zoom, keeping the stroke
//! and card stores, and recording every mutation in an undo/redo log. It does
//! no rendering and no I/O; the host paints from the stores' read-only views
//! and reacts to the [`engine::Action`]s returned by each call.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`] context object and the gesture transitions |
//! | [`input`] | Pointer event types and the gesture state enum |
//! | [`stroke`] | Ink strokes, decimation, and the two-layer stroke store |
//! | [`card`] | Content cards and the card store |
//! | [`history`] | Reversible history entries and the undo/redo stacks |
//! | [`camera`] | Screen/canvas transform |
//! | [`viewport`] | Pan/zoom controller and visible rectangle |
//! | [`geometry`] | Rectangles and normalized-box encoding |
//! | [`hit`] | Hit-testing against cards and strokes |
//! | [`consts`] | Shared numeric constants (zoom limits, decimation, eraser radius) |

pub mod camera;
pub mod card;
pub mod consts;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod input;
pub mod stroke;
pub mod viewport;
