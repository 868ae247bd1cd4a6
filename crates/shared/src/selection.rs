//! Selection, search highlight and beacon state, plus the camera flight
//! that centres a committed node.

use crate::models::ViewportState;

/// Which of the three interaction modes the viewer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Nothing selected or beaconed; the animation loop is stopped.
    Idle,
    /// A search result carries the beacon.
    Searching,
    /// A node is selected and pulsing.
    Selected,
}

/// Node indices refer to the dataset; the beacon is keyed by node id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    selected: Option<usize>,
    highlighted: Option<usize>,
    beacon: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn beacon(&self) -> Option<&str> {
        self.beacon.as_deref()
    }

    /// Commit a selection. Any search beacon and highlight are dropped.
    pub fn select(&mut self, node: usize) {
        self.beacon = None;
        self.highlighted = None;
        self.selected = Some(node);
    }

    /// Beacon a search result without touching the selection. A node
    /// without an id is highlighted but never carries the beacon.
    pub fn highlight(&mut self, node: usize, id: impl Into<String>) {
        let id = id.into();
        self.highlighted = Some(node);
        self.beacon = (!id.is_empty()).then_some(id);
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
        self.beacon = None;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The pulse animation runs while anything pulses.
    pub fn animation_active(&self) -> bool {
        self.selected.is_some() || self.beacon.is_some()
    }

    pub fn mode(&self) -> SelectionMode {
        if self.beacon.is_some() {
            SelectionMode::Searching
        } else if self.selected.is_some() {
            SelectionMode::Selected
        } else {
            SelectionMode::Idle
        }
    }

    pub fn is_beaconed(&self, id: &str) -> bool {
        !id.is_empty() && self.beacon.as_deref() == Some(id)
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Animated move of the viewport towards a node.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFlight {
    pub node: usize,
    from: ViewportState,
    to: ViewportState,
    duration_ms: f64,
    started_ms: f64,
}

impl CameraFlight {
    /// The clock starts at `started_ms`, the moment the selection was committed.
    pub fn new(
        node: usize,
        from: ViewportState,
        to: ViewportState,
        duration_ms: f64,
        started_ms: f64,
    ) -> Self {
        Self {
            node,
            from,
            to,
            duration_ms,
            started_ms,
        }
    }

    pub fn target(&self) -> ViewportState {
        self.to
    }

    /// Viewport at `now_ms` and whether the flight has finished.
    pub fn sample(&mut self, now_ms: f64) -> (ViewportState, bool) {
        let progress = if self.duration_ms > 0.0 {
            ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = ease_out_cubic(progress);
        let state = ViewportState::new(
            lerp(self.from.scale, self.to.scale, eased),
            lerp(self.from.offset_x, self.to.offset_x, eased),
            lerp(self.from.offset_y, self.to.offset_y, eased),
        );
        (state, progress >= 1.0)
    }
}
