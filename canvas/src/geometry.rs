//! Rectangles and the normalized-box encoding used on the generation wire.
//!
//! A [`NormalizedBox`] expresses a rectangle as fractions of the visible
//! canvas rectangle, so a response computed against one viewport can be placed
//! back onto the canvas regardless of the device's pixel size. Encoding and
//! decoding are exact inverses up to floating-point rounding.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;

/// Errors from coordinate-space conversions.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The reference rectangle has zero (or non-finite) width or height.
    #[error("degenerate viewport: {width}x{height}")]
    DegenerateViewport { width: f64, height: f64 },
}

/// Axis-aligned rectangle in canvas (or screen) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Whether the rectangle has finite coordinates and strictly positive size.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite()) && self.w > 0.0 && self.h > 0.0
    }

    /// Whether `p` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Whether the two rectangles overlap with non-zero area.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    /// A copy shifted by `(dx, dy)`.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

/// A rectangle expressed as fractions of a reference rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

fn check_reference(visible: &Rect) -> Result<(), GeometryError> {
    let usable = visible.w.is_finite() && visible.h.is_finite() && visible.w != 0.0 && visible.h != 0.0;
    if usable {
        Ok(())
    } else {
        Err(GeometryError::DegenerateViewport { width: visible.w, height: visible.h })
    }
}

/// Decode a normalized box into a canvas rectangle relative to `visible`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateViewport`] if `visible` has no area.
pub fn normalized_box_to_canvas_rect(nbox: &NormalizedBox, visible: &Rect) -> Result<Rect, GeometryError> {
    check_reference(visible)?;
    Ok(Rect {
        x: visible.x + nbox.x * visible.w,
        y: visible.y + nbox.y * visible.h,
        w: nbox.w * visible.w,
        h: nbox.h * visible.h,
    })
}

/// Encode a canvas rectangle as a normalized box relative to `visible`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateViewport`] if `visible` has no area.
pub fn canvas_rect_to_normalized_box(rect: &Rect, visible: &Rect) -> Result<NormalizedBox, GeometryError> {
    check_reference(visible)?;
    Ok(NormalizedBox {
        x: (rect.x - visible.x) / visible.w,
        y: (rect.y - visible.y) / visible.h,
        w: rect.w / visible.w,
        h: rect.h / visible.h,
    })
}
