#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::card::{Card, CardStore};
use crate::stroke::{StrokeId, StrokeStore};

/// Topmost card containing `canvas_pt`, if any.
#[must_use]
pub fn card_at(cards: &CardStore, canvas_pt: Point) -> Option<&Card> {
    cards.cards().iter().rev().find(|c| c.rect.contains(canvas_pt))
}

/// Ids of committed strokes (both layers) the eraser would remove at `canvas_pt`.
#[must_use]
pub fn strokes_near(strokes: &StrokeStore, canvas_pt: Point, radius: f64) -> Vec<StrokeId> {
    strokes
        .permanent()
        .iter()
        .chain(strokes.magic())
        .filter(|s| s.touches(canvas_pt, radius))
        .map(|s| s.id)
        .collect()
}
