//! Node info popup: placement next to the marker and automatic dismissal
//! once the view has moved too far from where it was opened.

use crate::config::ViewerConfig;
use crate::models::ViewportState;

/// Gap between the marker and the popup's bottom-left corner.
pub const POPUP_OFFSET_PX: f64 = 12.0;
/// Minimum distance kept from the viewport edges.
pub const POPUP_MARGIN_PX: f64 = 8.0;
/// Used when the host could not measure the popup.
pub const FALLBACK_POPUP_SIZE: (f64, f64) = (220.0, 80.0);

/// Top-left corner of the popup in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupPlacement {
    pub left: f64,
    pub top: f64,
}

/// Place a `size` popup above and to the right of `anchor`, kept inside the
/// viewport. When the popup is larger than the viewport the top-left margin wins.
pub fn anchor_popup(anchor: (f64, f64), size: (f64, f64), viewport: (f64, f64)) -> PopupPlacement {
    let (w, h) = size;
    let left = anchor.0 + POPUP_OFFSET_PX;
    let top = anchor.1 - h - POPUP_OFFSET_PX;
    PopupPlacement {
        left: left.min(viewport.0 - w - POPUP_MARGIN_PX).max(POPUP_MARGIN_PX),
        top: top.min(viewport.1 - h - POPUP_MARGIN_PX).max(POPUP_MARGIN_PX),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Hidden,
    /// Content is rendered invisibly so the host can measure it.
    Measuring,
    Shown(PopupPlacement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupController {
    node: Option<usize>,
    phase: Phase,
    open_scale: f64,
    open_offset: (f64, f64),
    pan_accum: f64,
    dismiss_pan_px: f64,
    dismiss_zoom_log: f64,
}

impl PopupController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            node: None,
            phase: Phase::Hidden,
            open_scale: 1.0,
            open_offset: (0.0, 0.0),
            pan_accum: 0.0,
            dismiss_pan_px: config.popup_dismiss_pan_px,
            dismiss_zoom_log: config.popup_dismiss_zoom_ratio.ln(),
        }
    }

    pub fn node(&self) -> Option<usize> {
        self.node
    }

    pub fn is_visible(&self) -> bool {
        self.phase != Phase::Hidden
    }

    /// Waiting for the host to report the rendered size.
    pub fn needs_measure(&self) -> bool {
        self.phase == Phase::Measuring
    }

    pub fn placement(&self) -> Option<PopupPlacement> {
        match self.phase {
            Phase::Shown(p) => Some(p),
            _ => None,
        }
    }

    /// Open for `node`, recording the view it was opened at.
    pub fn open(&mut self, node: usize, view: ViewportState) {
        self.node = Some(node);
        self.phase = Phase::Measuring;
        self.open_scale = view.scale;
        self.open_offset = view.offset();
        self.pan_accum = 0.0;
    }

    /// Finish opening with the measured size (zero sizes use the fallback).
    pub fn place(&mut self, measured: (f64, f64), anchor: (f64, f64), viewport: (f64, f64)) {
        if self.phase == Phase::Hidden {
            return;
        }
        let size = (
            if measured.0 > 0.0 { measured.0 } else { FALLBACK_POPUP_SIZE.0 },
            if measured.1 > 0.0 { measured.1 } else { FALLBACK_POPUP_SIZE.1 },
        );
        self.phase = Phase::Shown(anchor_popup(anchor, size, viewport));
    }

    pub fn hide(&mut self) {
        self.node = None;
        self.phase = Phase::Hidden;
    }

    /// Pan distance is measured from the latest press, not from opening.
    pub fn rebase_pan_origin(&mut self, offset: (f64, f64)) {
        if self.is_visible() {
            self.open_offset = offset;
        }
    }

    /// Mouse drags accumulate the length of every move. Returns true if dismissed.
    pub fn observe_drag(&mut self, dx: f64, dy: f64) -> bool {
        if !self.is_visible() {
            return false;
        }
        self.pan_accum += dx.hypot(dy);
        if self.pan_accum > self.dismiss_pan_px {
            self.pan_accum = 0.0;
            self.hide();
            return true;
        }
        false
    }

    /// Touch pans compare the straight-line distance from the open offset.
    pub fn observe_touch_pan(&mut self, offset: (f64, f64)) -> bool {
        if !self.is_visible() {
            return false;
        }
        let dist = (offset.0 - self.open_offset.0).hypot(offset.1 - self.open_offset.1);
        if dist > self.dismiss_pan_px {
            self.hide();
            return true;
        }
        false
    }

    /// Dismiss once the zoom has changed by more than the configured ratio
    /// in either direction.
    pub fn observe_zoom(&mut self, scale: f64) -> bool {
        if !self.is_visible() || self.open_scale <= 0.0 {
            return false;
        }
        if (scale / self.open_scale).ln().abs() > self.dismiss_zoom_log {
            self.hide();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> PopupController {
        let mut p = PopupController::new(&ViewerConfig::default());
        p.open(3, ViewportState::new(1.0, -100.0, -100.0));
        p
    }

    #[test]
    fn test_anchor_top_right_of_marker() {
        let p = anchor_popup((400.0, 300.0), (200.0, 100.0), (1000.0, 800.0));
        assert_eq!(p, PopupPlacement { left: 412.0, top: 188.0 });
    }

    #[test]
    fn test_anchor_clamped_to_viewport() {
        // Near the top-right corner
        let p = anchor_popup((950.0, 20.0), (200.0, 100.0), (1000.0, 800.0));
        assert_eq!(p, PopupPlacement { left: 792.0, top: 8.0 });
        // Popup wider than the viewport keeps the left margin
        let p = anchor_popup((10.0, 500.0), (2000.0, 100.0), (1000.0, 800.0));
        assert!((p.left - POPUP_MARGIN_PX).abs() < 1e-9);
    }

    #[test]
    fn test_measure_then_place() {
        let mut p = opened();
        assert!(p.is_visible());
        assert!(p.needs_measure());
        assert!(p.placement().is_none());
        p.place((0.0, 0.0), (100.0, 400.0), (1000.0, 800.0));
        // Fallback 220x80
        assert_eq!(p.placement(), Some(PopupPlacement { left: 112.0, top: 308.0 }));
        assert_eq!(p.node(), Some(3));
    }

    #[test]
    fn test_place_after_hide_is_ignored() {
        let mut p = opened();
        p.hide();
        p.place((100.0, 50.0), (0.0, 0.0), (500.0, 500.0));
        assert!(!p.is_visible());
    }

    #[test]
    fn test_drag_dismiss_accumulates_path_length() {
        let mut p = opened();
        // Back and forth: net zero, path 200
        assert!(!p.observe_drag(100.0, 0.0));
        assert!(!p.observe_drag(-100.0, 0.0));
        assert!(p.observe_drag(0.0, 61.0));
        assert!(!p.is_visible());
    }

    #[test]
    fn test_touch_dismiss_uses_straight_line() {
        let mut p = opened();
        assert!(!p.observe_touch_pan((100.0, -100.0)));
        assert!(p.observe_touch_pan((-100.0, 170.0)));
    }

    #[test]
    fn test_rebase_moves_touch_origin() {
        let mut p = opened();
        p.rebase_pan_origin((-100.0, 200.0));
        assert!(!p.observe_touch_pan((-100.0, 170.0)));
    }

    #[test]
    fn test_zoom_dismiss_both_directions() {
        let mut p = opened();
        assert!(!p.observe_zoom(1.7));
        assert!(p.observe_zoom(1.81));

        let mut p = opened();
        assert!(!p.observe_zoom(0.6));
        assert!(p.observe_zoom(0.55));
    }

    #[test]
    fn test_hidden_popup_ignores_motion() {
        let mut p = PopupController::new(&ViewerConfig::default());
        assert!(!p.observe_drag(1000.0, 0.0));
        assert!(!p.observe_zoom(10.0));
    }
}
