//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest scale factor reachable by pinch-zoom.
pub const MIN_SCALE: f64 = 0.25;

/// Largest scale factor reachable by pinch-zoom.
pub const MAX_SCALE: f64 = 4.0;

// ── Ink ─────────────────────────────────────────────────────────

/// Squared screen-space distance (px²) below which a new point is decimated.
pub const DECIMATION_THRESHOLD_SQ_PX: f64 = 1.0;

/// Eraser hit-test radius in canvas units.
pub const ERASER_RADIUS: f64 = 30.0;

/// Minimum number of points a stroke needs to be committed.
pub const MIN_STROKE_POINTS: usize = 2;

/// Stroke width for permanent pen ink, in canvas units.
pub const PEN_WIDTH: f64 = 4.0;

/// Stroke width for magic ink, in canvas units.
pub const MAGIC_WIDTH: f64 = 6.0;

/// Permanent pen color (opaque near-black, ARGB).
pub const PEN_COLOR: u32 = 0xFF1F_1A17;

/// Magic ink color (opaque violet, ARGB).
pub const MAGIC_COLOR: u32 = 0xFF8A_2BE2;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo entries kept before the oldest is dropped.
pub const HISTORY_DEPTH: usize = 200;
