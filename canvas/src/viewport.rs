//! Viewport controller: the camera plus the pixel size of the drawing surface.
//!
//! All pan and zoom changes go through this type so the scale clamp and the
//! anchor-preserving zoom math live in one place.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::camera::{Camera, Point};
use crate::consts::{MAX_SCALE, MIN_SCALE};
use crate::geometry::Rect;

/// Pan/zoom state for the canvas surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    camera: Camera,
    width_px: f64,
    height_px: f64,
    min_scale: f64,
    max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Viewport {
    /// Identity viewport of the given pixel size.
    #[must_use]
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self { camera: Camera::default(), width_px, height_px, min_scale: MIN_SCALE, max_scale: MAX_SCALE }
    }

    /// Override the allowed scale range. Bounds are swapped if given reversed.
    #[must_use]
    pub fn with_scale_limits(mut self, min: f64, max: f64) -> Self {
        self.min_scale = min.min(max);
        self.max_scale = max.max(min);
        self.camera.scale = self.clamp_scale(self.camera.scale);
        self
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.camera.scale
    }

    /// Pixel size of the drawing surface as `(width, height)`.
    #[must_use]
    pub fn size_px(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    /// Update the surface size after a layout change. Offset and scale are kept.
    pub fn set_size(&mut self, width_px: f64, height_px: f64) {
        self.width_px = width_px;
        self.height_px = height_px;
    }

    /// Replace the camera wholesale (e.g. when restoring a saved document).
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Camera { scale: self.clamp_scale(camera.scale), ..camera };
    }

    /// The canvas-space rectangle currently visible on screen.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        let top_left = self.camera.screen_to_canvas(Point::new(0.0, 0.0));
        Rect {
            x: top_left.x,
            y: top_left.y,
            w: self.camera.screen_dist_to_canvas(self.width_px),
            h: self.camera.screen_dist_to_canvas(self.height_px),
        }
    }

    /// Translate the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.camera.offset_x += dx;
        self.camera.offset_y += dy;
    }

    /// Zoom by `factor` so that the canvas point under `prev_center` ends up
    /// under `new_center`. Returns `true` if the camera changed.
    ///
    /// The resulting scale is clamped to the configured range; the anchor is
    /// solved against the clamped scale, so it holds even at the limits.
    pub fn zoom_about(&mut self, prev_center: Point, new_center: Point, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let anchor = self.camera.screen_to_canvas(prev_center);
        let scale = self.clamp_scale(self.camera.scale * factor);
        let next = Camera {
            offset_x: new_center.x - anchor.x * scale,
            offset_y: new_center.y - anchor.y * scale,
            scale,
        };
        let changed = next != self.camera;
        self.camera = next;
        changed
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}
