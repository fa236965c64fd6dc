//! Ink strokes and the two-layer stroke store.
//!
//! Committed strokes live in one of two ordered layers: the permanent layer
//! (regular pen ink) and the magic layer (ink that is sent to the generation
//! service). At most one stroke is in progress at a time; it accepts points
//! until it is committed or discarded, after which it never changes again.
//!
//! Point decimation happens here. A point closer to the previous recorded
//! point than the screen-space threshold is held back instead of recorded; if
//! it turns out to be the final point of the stroke it is appended on commit,
//! so the first and last points of a stroke always survive.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{
    DECIMATION_THRESHOLD_SQ_PX, MAGIC_COLOR, MAGIC_WIDTH, MIN_STROKE_POINTS, PEN_COLOR, PEN_WIDTH,
};
use crate::geometry::Rect;
use crate::history::Removed;

/// Unique identifier for a stroke.
pub type StrokeId = Uuid;

/// A sampled ink point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkPoint {
    pub x: f64,
    pub y: f64,
    /// Normalized pen pressure in `[0, 1]`.
    pub pressure: f64,
}

impl InkPoint {
    /// Build a point, clamping `pressure` into `[0, 1]` (NaN becomes 0).
    #[must_use]
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        let pressure = if pressure.is_nan() { 0.0 } else { pressure.clamp(0.0, 1.0) };
        Self { x, y, pressure }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Opaque ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

/// Which committed layer a stroke belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Regular ink that stays on the canvas.
    Permanent,
    /// Prompt ink consumed by the next generation.
    Magic,
}

/// Ink mode used when a stroke is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkMode {
    #[default]
    Pen,
    Magic,
}

impl InkMode {
    /// The layer strokes drawn in this mode are committed to.
    #[must_use]
    pub fn layer(self) -> Layer {
        match self {
            Self::Pen => Layer::Permanent,
            Self::Magic => Layer::Magic,
        }
    }

    #[must_use]
    pub fn color(self) -> Color {
        match self {
            Self::Pen => Color(PEN_COLOR),
            Self::Magic => Color(MAGIC_COLOR),
        }
    }

    #[must_use]
    pub fn width(self) -> f64 {
        match self {
            Self::Pen => PEN_WIDTH,
            Self::Magic => MAGIC_WIDTH,
        }
    }
}

/// A freehand ink stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<InkPoint>,
    pub is_magic: bool,
    pub width: f64,
    pub color: Color,
}

impl Stroke {
    #[must_use]
    pub fn layer(&self) -> Layer {
        if self.is_magic { Layer::Magic } else { Layer::Permanent }
    }

    /// Whether any point of this stroke lies within `radius` of `center`.
    #[must_use]
    pub fn touches(&self, center: Point, radius: f64) -> bool {
        let r_sq = radius * radius;
        self.points
            .iter()
            .any(|p| p.position().dist_sq(center) <= r_sq)
    }

    /// Whether this stroke's bounding box overlaps `rect`, edges inclusive.
    #[must_use]
    pub fn overlaps(&self, rect: &Rect) -> bool {
        let Some(first) = self.points.first() else {
            return false;
        };
        let (min_x, min_y, max_x, max_y) = self.points.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)),
        );
        min_x <= rect.right() && rect.x <= max_x && min_y <= rect.bottom() && rect.y <= max_y
    }
}

/// Strokes removed by an erase, each with the index it occupied at removal time.
///
/// Entries are in removal order; re-inserting them in reverse order restores
/// the layers exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Erasure {
    pub removed_permanent: Vec<Removed<Stroke>>,
    pub removed_magic: Vec<Removed<Stroke>>,
}

impl Erasure {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed_permanent.is_empty() && self.removed_magic.is_empty()
    }

    /// Total number of strokes removed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.removed_permanent.len() + self.removed_magic.len()
    }

    /// Append the removals of a later erase step.
    pub fn extend(&mut self, later: Erasure) {
        self.removed_permanent.extend(later.removed_permanent);
        self.removed_magic.extend(later.removed_magic);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct InProgress {
    stroke: Stroke,
    /// Last point rejected by decimation, appended on commit if nothing follows it.
    held: Option<InkPoint>,
}

/// Owner of all committed strokes plus the single in-progress stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStore {
    permanent: Vec<Stroke>,
    magic: Vec<Stroke>,
    current: Option<InProgress>,
    decimation_sq_px: f64,
}

impl Default for StrokeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeStore {
    /// Create an empty store with the default decimation threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_decimation(DECIMATION_THRESHOLD_SQ_PX)
    }

    /// Create an empty store rejecting points closer than `threshold_sq_px` (squared screen pixels).
    #[must_use]
    pub fn with_decimation(threshold_sq_px: f64) -> Self {
        Self { permanent: Vec::new(), magic: Vec::new(), current: None, decimation_sq_px: threshold_sq_px.max(0.0) }
    }

    // --- In-progress stroke ---

    /// Begin a new stroke at `point`. Any unfinished stroke is discarded.
    pub fn start_stroke(&mut self, point: InkPoint, mode: InkMode) {
        if self.current.is_some() {
            debug!("stroke: discarding unfinished stroke on restart");
        }
        let stroke = Stroke {
            id: Uuid::new_v4(),
            points: vec![point],
            is_magic: mode == InkMode::Magic,
            width: mode.width(),
            color: mode.color(),
        };
        self.current = Some(InProgress { stroke, held: None });
    }

    /// Append a point to the in-progress stroke, decimating against the last
    /// recorded point in screen space (`scale` = current viewport scale).
    ///
    /// Returns `true` if the point was recorded.
    pub fn append_point(&mut self, point: InkPoint, scale: f64) -> bool {
        let threshold = self.decimation_sq_px;
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        let too_close = current
            .stroke
            .points
            .last()
            .is_some_and(|last| last.position().dist_sq(point.position()) * scale * scale < threshold);
        if too_close {
            current.held = Some(point);
            return false;
        }
        current.stroke.points.push(point);
        current.held = None;
        true
    }

    /// Finish the in-progress stroke. Strokes with fewer than two points are
    /// discarded and `None` is returned.
    pub fn commit_stroke(&mut self) -> Option<Stroke> {
        let InProgress { mut stroke, held } = self.current.take()?;
        if let Some(last) = held {
            stroke.points.push(last);
        }
        if stroke.points.len() < MIN_STROKE_POINTS {
            debug!(id = %stroke.id, points = stroke.points.len(), "stroke: discarded short stroke");
            return None;
        }
        self.layer_vec(stroke.layer()).push(stroke.clone());
        Some(stroke)
    }

    /// Drop the in-progress stroke without committing it.
    pub fn cancel_stroke(&mut self) -> Option<Stroke> {
        self.current.take().map(|c| c.stroke)
    }

    // --- Erasing ---

    /// Remove every committed stroke (both layers) that has a point within
    /// `radius` of `center`.
    pub fn erase_near(&mut self, center: Point, radius: f64) -> Erasure {
        Erasure {
            removed_permanent: remove_where(&mut self.permanent, |s| s.touches(center, radius)),
            removed_magic: remove_where(&mut self.magic, |s| s.touches(center, radius)),
        }
    }

    /// Remove every magic stroke.
    pub fn clear_magic_layer(&mut self) -> Vec<Removed<Stroke>> {
        let mut removed = Vec::with_capacity(self.magic.len());
        while let Some(item) = self.magic.pop() {
            removed.push(Removed { index: self.magic.len(), item });
        }
        removed
    }

    /// Remove the magic strokes with the given ids, leaving any others in place.
    pub fn remove_magic(&mut self, ids: &[StrokeId]) -> Vec<Removed<Stroke>> {
        remove_where(&mut self.magic, |s| ids.contains(&s.id))
    }

    // --- Replay primitives (used by history) ---

    /// Append a committed stroke to `layer`.
    pub fn push(&mut self, layer: Layer, stroke: Stroke) {
        self.layer_vec(layer).push(stroke);
    }

    /// Insert a committed stroke at `index` in `layer` (clamped to the layer length).
    pub fn insert_at(&mut self, layer: Layer, index: usize, stroke: Stroke) {
        let strokes = self.layer_vec(layer);
        let index = index.min(strokes.len());
        strokes.insert(index, stroke);
    }

    /// Remove a committed stroke from `layer` by id.
    pub fn remove(&mut self, layer: Layer, id: &StrokeId) -> Option<Removed<Stroke>> {
        let strokes = self.layer_vec(layer);
        let index = strokes.iter().position(|s| &s.id == id)?;
        Some(Removed { index, item: strokes.remove(index) })
    }

    // --- Queries ---

    #[must_use]
    pub fn layer(&self, layer: Layer) -> &[Stroke] {
        match layer {
            Layer::Permanent => &self.permanent,
            Layer::Magic => &self.magic,
        }
    }

    #[must_use]
    pub fn permanent(&self) -> &[Stroke] {
        &self.permanent
    }

    #[must_use]
    pub fn magic(&self) -> &[Stroke] {
        &self.magic
    }

    /// The stroke being drawn, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Stroke> {
        self.current.as_ref().map(|c| &c.stroke)
    }

    /// Whether any committed magic ink exists.
    #[must_use]
    pub fn has_magic_ink(&self) -> bool {
        !self.magic.is_empty()
    }

    fn layer_vec(&mut self, layer: Layer) -> &mut Vec<Stroke> {
        match layer {
            Layer::Permanent => &mut self.permanent,
            Layer::Magic => &mut self.magic,
        }
    }
}

/// Remove matching strokes in order, recording each one's index at the moment
/// it was removed.
fn remove_where(strokes: &mut Vec<Stroke>, pred: impl Fn(&Stroke) -> bool) -> Vec<Removed<Stroke>> {
    let mut removed = Vec::new();
    let mut i = 0;
    while i < strokes.len() {
        if pred(&strokes[i]) {
            removed.push(Removed { index: i, item: strokes.remove(i) });
        } else {
            i += 1;
        }
    }
    removed
}
