//! Screen <-> map coordinate transform and its legal bounds.
//!
//! Three coordinate systems are in play:
//! - *screen*: viewport pixels, origin top-left.
//! - *surface*: raster pixels, origin top-left (what the draw surface sees).
//! - *map*: raster pixels, origin bottom-left (what the dataset stores).

use tracing::debug;

use crate::models::{MapAsset, ViewportState};

/// Pixels the map may be pulled down past its top edge.
pub const TOP_OVERPAN: f64 = 150.0;

/// Scales within this factor of the minimum count as "at minimum zoom".
const MIN_SCALE_TOLERANCE: f64 = 1.01;

/// Damping applied to every zoom delta.
const ZOOM_EASING: f64 = 0.9;

/// Visible region of the drawing surface, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl SurfaceRect {
    /// Grow the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// What a resize did to the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeOutcome {
    /// The minimum scale moved, so resolution levels must be rebuilt.
    pub min_scale_changed: bool,
    /// The live scale fell below the new minimum and was snapped to it.
    pub snapped_to_min: bool,
}

/// Owns the live viewport state and keeps it within bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    state: ViewportState,
    map: MapAsset,
    viewport_width: f64,
    viewport_height: f64,
    min_scale: f64,
    max_scale: f64,
}

/// Minimum scale: the map height exactly fills the viewport.
pub fn min_scale_for(viewport_height: f64, map: MapAsset) -> f64 {
    if map.height == 0 || viewport_height <= 0.0 {
        return 1.0;
    }
    viewport_height / map.height_f()
}

impl Transform {
    /// Create a transform showing the initial view: minimum zoom, centred horizontally.
    pub fn new(map: MapAsset, viewport_width: f64, viewport_height: f64, max_scale: f64) -> Self {
        let min_scale = min_scale_for(viewport_height, map);
        let mut transform = Self {
            state: ViewportState::new(min_scale, 0.0, 0.0),
            map,
            viewport_width,
            viewport_height,
            min_scale,
            max_scale,
        };
        transform.reset();
        transform
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        self.state.offset()
    }

    pub fn map(&self) -> MapAsset {
        self.map
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    /// Upper bound, never below the minimum (tiny rasters in tall viewports).
    pub fn max_scale(&self) -> f64 {
        self.max_scale.max(self.min_scale)
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn viewport_center(&self) -> (f64, f64) {
        (self.viewport_width / 2.0, self.viewport_height / 2.0)
    }

    // --- coordinate conversion ---

    /// Surface (top-left origin) to screen.
    pub fn surface_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.state.scale + self.state.offset_x,
            y * self.state.scale + self.state.offset_y,
        )
    }

    /// Screen to surface (top-left origin). This is the inverse used for hit-testing.
    pub fn screen_to_surface(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.state.offset_x) / self.state.scale,
            (sy - self.state.offset_y) / self.state.scale,
        )
    }

    /// Map (bottom-left origin) to screen.
    pub fn map_to_screen(&self, mx: f64, my: f64) -> (f64, f64) {
        self.surface_to_screen(mx, self.map.flip_y(my))
    }

    /// Screen to map (bottom-left origin).
    pub fn screen_to_map(&self, sx: f64, sy: f64) -> (f64, f64) {
        let (x, y) = self.screen_to_surface(sx, sy);
        (x, self.map.flip_y(y))
    }

    /// The part of the surface currently inside the viewport.
    pub fn visible_surface_rect(&self) -> SurfaceRect {
        let left = -self.state.offset_x / self.state.scale;
        let top = -self.state.offset_y / self.state.scale;
        SurfaceRect {
            left,
            top,
            right: left + self.viewport_width / self.state.scale,
            bottom: top + self.viewport_height / self.state.scale,
        }
    }

    // --- mutation ---

    /// Zoom by `delta` keeping the point under `(center_x, center_y)` fixed.
    /// Returns `false` when the clamped scale did not change.
    pub fn zoom_at(&mut self, delta: f64, center_x: f64, center_y: f64) -> bool {
        let old_scale = self.state.scale;
        let new_scale = (old_scale + delta * ZOOM_EASING).clamp(self.min_scale, self.max_scale());
        if new_scale == old_scale {
            return false;
        }

        let ratio = new_scale / old_scale;
        self.state.offset_x = center_x - (center_x - self.state.offset_x) * ratio;
        self.state.offset_y = center_y - (center_y - self.state.offset_y) * ratio;
        self.state.scale = new_scale;
        self.clamp_pan();
        true
    }

    /// Zoom anchored at the viewport centre (buttons and keys).
    pub fn zoom_by_step(&mut self, delta: f64) -> bool {
        let (cx, cy) = self.viewport_center();
        self.zoom_at(delta, cx, cy)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.state.offset_x += dx;
        self.state.offset_y += dy;
        self.clamp_pan();
    }

    /// Keep the map covering (or centred in) the viewport horizontally, and
    /// never expose blank canvas below the map's bottom edge at minimum zoom.
    pub fn clamp_pan(&mut self) {
        let scaled_w = self.map.width_f() * self.state.scale;
        let scaled_h = self.map.height_f() * self.state.scale;

        let slack_x = self.viewport_width - scaled_w;
        let min_x = slack_x.min(0.0);
        let max_x = slack_x.max(0.0);

        let min_y = if self.state.scale <= self.min_scale * MIN_SCALE_TOLERANCE {
            0.0
        } else {
            (self.viewport_height - scaled_h).min(0.0)
        };
        let max_y = TOP_OVERPAN;

        self.state.offset_x = self.state.offset_x.max(min_x).min(max_x);
        self.state.offset_y = self.state.offset_y.max(min_y).min(max_y);
    }

    /// Replace the whole state (camera flights), then re-clamp.
    pub fn set_state(&mut self, state: ViewportState) {
        self.state = ViewportState {
            scale: state.scale.clamp(self.min_scale, self.max_scale()),
            ..state
        };
        self.clamp_pan();
    }

    /// Back to the initial view.
    pub fn reset(&mut self) {
        self.state.scale = self.min_scale;
        self.center_horizontally();
        self.clamp_pan();
    }

    /// Viewport state that puts the map point `(mx, my)` at the viewport centre.
    pub fn centered_on(&self, mx: f64, my: f64, scale: f64) -> ViewportState {
        let (cx, cy) = self.viewport_center();
        ViewportState::new(scale, cx - mx * scale, cy - self.map.flip_y(my) * scale)
    }

    /// Adapt to a new viewport size.
    pub fn resize(&mut self, width: f64, height: f64) -> ResizeOutcome {
        let (old_w, old_h) = (self.viewport_width, self.viewport_height);
        self.viewport_width = width;
        self.viewport_height = height;

        let new_min = min_scale_for(height, self.map);
        let min_scale_changed = new_min != self.min_scale;
        self.min_scale = new_min;
        debug!(min_scale = new_min, width, height, "Viewport resized");

        let snapped_to_min = self.state.scale < self.min_scale;
        if snapped_to_min {
            self.state.scale = self.min_scale;
            self.center_horizontally();
        } else {
            if old_w > 0.0 {
                self.state.offset_x *= width / old_w;
            }
            if old_h > 0.0 {
                self.state.offset_y *= height / old_h;
            }
        }
        self.clamp_pan();

        ResizeOutcome {
            min_scale_changed,
            snapped_to_min,
        }
    }

    fn center_horizontally(&mut self) {
        let scaled_w = self.map.width_f() * self.state.scale;
        self.state.offset_x = (self.viewport_width - scaled_w) / 2.0;
        self.state.offset_y = 0.0;
    }
}
