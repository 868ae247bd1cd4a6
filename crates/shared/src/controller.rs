//! The single owner of viewer state.
//!
//! Hosts forward raw input to a [`MapController`] and act on the returned
//! [`Effects`]: schedule a frame, rebuild resolution levels, move focus,
//! re-render the overlay UI. Nothing here touches the DOM.

use std::ops::{BitOr, BitOrAssign};

use tracing::debug;

use crate::cache::MapRaster;
use crate::config::ViewerConfig;
use crate::gesture::{key_command, GestureRouter, Key, KeyCommand, Point, TouchMove, WheelDeltaMode};
use crate::models::{MapAsset, Node};
use crate::popup::PopupController;
use crate::render::{render_frame, Frame, FrameStats, RenderTarget};
use crate::scheduler::RenderLoop;
use crate::search::{SearchOutcome, SearchSession};
use crate::selection::{CameraFlight, SelectionState};
use crate::transform::Transform;

/// Work the host must do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effects {
    /// Request an animation frame.
    pub schedule_frame: bool,
    /// Minimum scale changed; rebuild the resolution ladder.
    pub rebuild_levels: bool,
    pub focus_search: bool,
    pub blur_search: bool,
    pub prevent_default: bool,
    /// Search box, results list, popup or help overlay changed.
    pub ui_changed: bool,
    /// Call [`MapController::expire_click_suppression`] after a zero-delay timeout.
    pub expire_click_later: bool,
}

impl BitOrAssign for Effects {
    fn bitor_assign(&mut self, rhs: Self) {
        self.schedule_frame |= rhs.schedule_frame;
        self.rebuild_levels |= rhs.rebuild_levels;
        self.focus_search |= rhs.focus_search;
        self.blur_search |= rhs.blur_search;
        self.prevent_default |= rhs.prevent_default;
        self.ui_changed |= rhs.ui_changed;
        self.expire_click_later |= rhs.expire_click_later;
    }
}

impl BitOr for Effects {
    type Output = Effects;

    fn bitor(mut self, rhs: Self) -> Self::Output {
        self |= rhs;
        self
    }
}

/// Result of one animation frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOutcome {
    /// Schedule another frame right away.
    pub schedule_next: bool,
    pub ui_changed: bool,
}

pub struct MapController {
    config: ViewerConfig,
    nodes: Vec<Node>,
    transform: Transform,
    gestures: GestureRouter,
    search: SearchSession,
    selection: SelectionState,
    flight: Option<CameraFlight>,
    popup: PopupController,
    frames: RenderLoop,
    search_focused: bool,
    help_visible: bool,
}

impl MapController {
    /// Start at the initial view for a `viewport` sized canvas.
    pub fn new(config: ViewerConfig, map: MapAsset, nodes: Vec<Node>, viewport: (f64, f64)) -> Self {
        let transform = Transform::new(map, viewport.0, viewport.1, config.max_scale);
        debug!(
            min_scale = transform.min_scale(),
            nodes = nodes.len(),
            "Viewer initialised"
        );
        Self {
            popup: PopupController::new(&config),
            config,
            nodes,
            transform,
            gestures: GestureRouter::new(),
            search: SearchSession::new(),
            selection: SelectionState::new(),
            flight: None,
            frames: RenderLoop::new(),
            search_focused: false,
            help_visible: false,
        }
    }

    // --- read access for hosts ---

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    pub fn is_search_focused(&self) -> bool {
        self.search_focused
    }

    pub fn is_help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    /// Node under a screen point: first in dataset order within the hit radius.
    pub fn hit_test(&self, sx: f64, sy: f64) -> Option<usize> {
        let (x, y) = self.transform.screen_to_surface(sx, sy);
        let radius = self.config.node_radius.max(self.config.hit_radius_px) / self.transform.scale();
        let map = self.transform.map();
        self.nodes.iter().position(|node| {
            let (nx, ny) = map.surface_position(node);
            (nx - x).hypot(ny - y) < radius
        })
    }

    // --- frames ---

    /// The host dropped its frame primitive; any outstanding frame is gone.
    pub fn frames_cancelled(&mut self) {
        self.frames.cancel();
    }

    pub fn request_redraw(&mut self) -> Effects {
        Effects {
            schedule_frame: self.frames.request(),
            ..Effects::default()
        }
    }

    /// Advance time-driven state. Call once per animation frame, before drawing.
    pub fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        let mut ui_changed = false;

        if let Some((delta, (x, y))) = self.gestures.take_wheel_zoom() {
            ui_changed |= self.zoom_at(delta, x, y).ui_changed;
        }

        if let Some(flight) = self.flight.as_mut() {
            let (state, done) = flight.sample(now_ms);
            let node = flight.node;
            self.transform.set_state(state);
            if done {
                self.flight = None;
                self.popup.open(node, self.transform.state());
                ui_changed = true;
            }
        }

        let keep_running = self.selection.animation_active() || self.flight.is_some();
        FrameOutcome {
            schedule_next: self.frames.frame_done(keep_running),
            ui_changed,
        }
    }

    pub fn render<T: RenderTarget>(
        &self,
        target: &mut T,
        raster: Option<&MapRaster<T::Image>>,
        now_ms: f64,
    ) -> FrameStats {
        let frame = Frame {
            transform: &self.transform,
            nodes: &self.nodes,
            selection: &self.selection,
            now_ms,
        };
        render_frame(target, raster, &frame, &self.config)
    }

    /// The host measured the popup it was asked to lay out.
    pub fn place_popup(&mut self, size: (f64, f64)) -> Effects {
        let Some(anchor) = self
            .popup
            .node()
            .and_then(|i| self.nodes.get(i))
            .map(|node| self.transform.map_to_screen(node.x, node.y))
        else {
            return Effects::default();
        };
        if !self.popup.needs_measure() {
            return Effects::default();
        }
        self.popup.place(size, anchor, self.transform.viewport_size());
        Effects {
            ui_changed: true,
            ..Effects::default()
        }
    }

    // --- mouse ---

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Effects {
        self.gestures.pointer_down(x, y);
        self.popup.rebase_pan_origin(self.transform.offset());
        Effects {
            prevent_default: true,
            ..Effects::default()
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Effects {
        let Some((dx, dy)) = self.gestures.pointer_move(x, y) else {
            return Effects::default();
        };
        self.transform.pan_by(dx, dy);
        let dismissed = self.popup.observe_drag(dx, dy);
        self.request_redraw()
            | Effects {
                ui_changed: dismissed,
                ..Effects::default()
            }
    }

    /// Button released or pointer left the canvas.
    pub fn pointer_up(&mut self) -> Effects {
        Effects {
            expire_click_later: self.gestures.pointer_up(),
            ..Effects::default()
        }
    }

    pub fn click(&mut self, x: f64, y: f64, now_ms: f64) -> Effects {
        match self.gestures.click(x, y) {
            Some((x, y)) => self.pick_at(x, y, now_ms),
            None => Effects::default(),
        }
    }

    pub fn expire_click_suppression(&mut self) {
        self.gestures.expire_click_suppression();
    }

    // --- wheel ---

    pub fn wheel(&mut self, delta_y: f64, mode: WheelDeltaMode, x: f64, y: f64) -> Effects {
        let first = self
            .gestures
            .wheel(delta_y, mode, x, y, self.config.zoom_speed);
        Effects {
            schedule_frame: first && self.frames.request(),
            prevent_default: true,
            ..Effects::default()
        }
    }

    // --- touch ---

    pub fn touch_start(&mut self, touches: &[Point], now_ms: f64) -> Effects {
        self.gestures.touch_start(touches, now_ms);
        Effects {
            prevent_default: true,
            ..Effects::default()
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> Effects {
        let effects = match self.gestures.touch_move(touches) {
            TouchMove::Pan { dx, dy } => {
                self.transform.pan_by(dx, dy);
                let dismissed = self.popup.observe_touch_pan(self.transform.offset());
                self.request_redraw()
                    | Effects {
                        ui_changed: dismissed,
                        ..Effects::default()
                    }
            }
            TouchMove::Zoom { delta, center } => self.zoom_at(delta, center.0, center.1),
            TouchMove::None => Effects::default(),
        };
        effects
            | Effects {
                prevent_default: true,
                ..Effects::default()
            }
    }

    pub fn touch_end(&mut self, remaining: &[Point], lifted: Option<Point>, now_ms: f64) -> Effects {
        let mut effects = Effects {
            prevent_default: true,
            ..Effects::default()
        };
        if let Some((x, y)) = self.gestures.touch_end(remaining, lifted, now_ms) {
            effects |= self.pick_at(x, y, now_ms);
            effects.expire_click_later = true;
        }
        effects
    }

    pub fn touch_cancel(&mut self) {
        self.gestures.touch_cancel();
    }

    // --- zoom and view ---

    fn zoom_at(&mut self, delta: f64, x: f64, y: f64) -> Effects {
        if !self.transform.zoom_at(delta, x, y) {
            return Effects::default();
        }
        let dismissed = self.popup.observe_zoom(self.transform.scale());
        self.request_redraw()
            | Effects {
                ui_changed: dismissed,
                ..Effects::default()
            }
    }

    pub fn zoom_in(&mut self) -> Effects {
        let (cx, cy) = self.transform.viewport_center();
        self.zoom_at(self.config.zoom_speed, cx, cy)
    }

    pub fn zoom_out(&mut self) -> Effects {
        let (cx, cy) = self.transform.viewport_center();
        self.zoom_at(-self.config.zoom_speed, cx, cy)
    }

    /// Back to the initial view with nothing selected or searched.
    pub fn reset_view(&mut self) -> Effects {
        self.transform.reset();
        self.flight = None;
        self.selection.clear();
        self.popup.hide();
        self.search.clear();
        self.request_redraw()
            | Effects {
                ui_changed: true,
                ..Effects::default()
            }
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Effects {
        let outcome = self.transform.resize(width, height);
        self.request_redraw()
            | Effects {
                rebuild_levels: outcome.min_scale_changed,
                ..Effects::default()
            }
    }

    // --- selection ---

    fn pick_at(&mut self, x: f64, y: f64, now_ms: f64) -> Effects {
        match self.hit_test(x, y) {
            Some(index) if self.config.fly_to_clicked_node => self.select_node(index, now_ms),
            Some(index) => self.select_in_place(index),
            None => {
                self.flight = None;
                self.popup.hide();
                self.selection.clear();
                self.request_redraw()
                    | Effects {
                        ui_changed: true,
                        ..Effects::default()
                    }
            }
        }
    }

    /// Select and show the popup without moving the camera.
    pub fn select_in_place(&mut self, index: usize) -> Effects {
        if index >= self.nodes.len() {
            return Effects::default();
        }
        self.flight = None;
        self.selection.select(index);
        self.popup.open(index, self.transform.state());
        self.request_redraw()
            | Effects {
                ui_changed: true,
                ..Effects::default()
            }
    }

    /// Commit a selection: fly the camera to the node, then show its popup.
    /// The search is cleared. The flight clock starts at `now_ms`.
    pub fn select_node(&mut self, index: usize, now_ms: f64) -> Effects {
        let Some(node) = self.nodes.get(index) else {
            return Effects::default();
        };
        let target = self
            .transform
            .centered_on(node.x, node.y, self.config.focus_target_scale());
        debug!(node = %node.id, "Flying to node");

        self.selection.select(index);
        self.popup.hide();
        self.flight = Some(CameraFlight::new(
            index,
            self.transform.state(),
            target,
            self.config.focus_duration_ms,
            now_ms,
        ));
        self.search.clear();
        self.request_redraw()
            | Effects {
                ui_changed: true,
                ..Effects::default()
            }
    }

    fn highlight(&mut self, index: usize) -> Effects {
        let Some(node) = self.nodes.get(index) else {
            return Effects::default();
        };
        self.selection.highlight(index, node.id.clone());
        self.request_redraw()
            | Effects {
                ui_changed: true,
                ..Effects::default()
            }
    }

    // --- keyboard ---

    pub fn key(&mut self, key: Key<'_>, now_ms: f64) -> Effects {
        let Some(command) = key_command(key, self.search_focused) else {
            return Effects::default();
        };
        let mut prevent_default = command.prevents_default();
        let effects = match command {
            KeyCommand::Dismiss => {
                self.popup.hide();
                self.help_visible = false;
                self.search_focused = false;
                self.clear_search()
                    | Effects {
                        blur_search: true,
                        ..Effects::default()
                    }
            }
            KeyCommand::CursorDown | KeyCommand::CursorUp => {
                if self.search.results().is_empty() {
                    prevent_default = false;
                    Effects::default()
                } else {
                    let down = command == KeyCommand::CursorDown;
                    match self.search.move_cursor(down) {
                        Some(index) => self.highlight(index),
                        None => Effects::default(),
                    }
                }
            }
            KeyCommand::CommitCursor => match self.search.cursor_node() {
                Some(index) => self.select_node(index, now_ms),
                None => Effects::default(),
            },
            KeyCommand::ZoomIn => self.zoom_in(),
            KeyCommand::ZoomOut => self.zoom_out(),
            KeyCommand::ResetView => self.reset_view(),
            KeyCommand::FocusSearch => Effects {
                focus_search: true,
                ..Effects::default()
            },
            KeyCommand::ToggleHelp => self.toggle_help(),
        };
        effects
            | Effects {
                prevent_default,
                ..Effects::default()
            }
    }

    pub fn toggle_help(&mut self) -> Effects {
        self.help_visible = !self.help_visible;
        Effects {
            ui_changed: true,
            ..Effects::default()
        }
    }

    pub fn close_help(&mut self) -> Effects {
        self.help_visible = false;
        Effects {
            ui_changed: true,
            ..Effects::default()
        }
    }

    // --- search box ---

    /// Raw input changed. The host debounces and then calls [`Self::run_search`].
    pub fn search_input(&mut self, text: &str) -> Effects {
        self.search.set_input(text);
        Effects {
            ui_changed: true,
            ..Effects::default()
        }
    }

    pub fn run_search(&mut self) -> Effects {
        let effects = match self.search.run(&self.nodes) {
            SearchOutcome::Results { top: Some(index) } => self.highlight(index),
            SearchOutcome::Results { top: None } | SearchOutcome::Cleared => {
                self.selection.clear_highlight();
                self.request_redraw()
            }
        };
        effects
            | Effects {
                ui_changed: true,
                ..Effects::default()
            }
    }

    pub fn clear_search(&mut self) -> Effects {
        self.search.clear();
        self.selection.clear_highlight();
        self.request_redraw()
            | Effects {
                ui_changed: true,
                ..Effects::default()
            }
    }

    pub fn search_focus(&mut self) -> Effects {
        self.search_focused = true;
        if self.search.should_rerun_on_focus() {
            self.run_search()
        } else {
            Effects::default()
        }
    }

    /// The input lost focus. The host hides the list after a short grace
    /// period via [`Self::search_blur_elapsed`].
    pub fn search_blur(&mut self) -> Effects {
        self.search_focused = false;
        Effects::default()
    }

    pub fn search_blur_elapsed(&mut self) -> Effects {
        let was_visible = self.search.is_list_visible();
        self.search.blur_elapsed();
        Effects {
            ui_changed: was_visible != self.search.is_list_visible(),
            ..Effects::default()
        }
    }

    /// A press landed outside the search container and results list.
    pub fn outside_pointer_down(&mut self) -> Effects {
        if !self.search_focused && !self.search.is_list_visible() {
            return Effects::default();
        }
        self.search_focused = false;
        self.search.hide_list();
        Effects {
            blur_search: true,
            ui_changed: true,
            ..Effects::default()
        }
    }

    pub fn result_hover(&mut self, row: usize) -> Effects {
        match self.search.hover(row) {
            Some(index) => self.highlight(index),
            None => Effects::default(),
        }
    }

    pub fn result_press_start(&mut self, row: usize, x: f64, y: f64) {
        self.search.press_start(row, x, y);
    }

    pub fn result_press_move(&mut self, x: f64, y: f64) {
        self.search.press_move(x, y);
    }

    pub fn result_press_end(&mut self, row: usize, now_ms: f64) -> Effects {
        match self.search.press_end(row) {
            Some(index) => self.select_node(index, now_ms),
            None => Effects::default(),
        }
    }

    pub fn result_press_leave(&mut self) {
        self.search.press_leave();
    }

    pub fn result_click(&mut self, row: usize, now_ms: f64) -> Effects {
        match self.search.row_click(row) {
            Some(index) => self.select_node(index, now_ms),
            None => Effects::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViewportState;
    use crate::render::testing::Recorder;
    use crate::selection::SelectionMode;

    fn nodes() -> Vec<Node> {
        vec![
            Node::new("n1", "Dock 5", 200.0, 800.0).with_description("Docking point"),
            Node::new("n2", "Dock 51", 600.0, 600.0),
            Node::new("n3", "Road", 700.0, 300.0),
            Node::new("n4", "", 400.0, 400.0).with_description("cs 5"),
        ]
    }

    fn controller() -> MapController {
        MapController::new(
            ViewerConfig::default(),
            MapAsset::new(1000, 1000),
            nodes(),
            (800.0, 500.0),
        )
    }

    /// Run frames 20ms apart until the loop stops or `limit` frames ran.
    fn run_frames(c: &mut MapController, mut now: f64, limit: usize) -> f64 {
        for _ in 0..limit {
            let out = c.frame(now);
            now += 20.0;
            if !out.schedule_next {
                break;
            }
        }
        now
    }

    #[test]
    fn test_click_hit_in_screen_space() {
        let mut c = controller();
        assert!((c.transform().min_scale() - 0.5).abs() < 1e-9);
        c.transform.set_state(ViewportState::new(0.5, 0.0, 0.0));
        // Screen (100,100) -> surface (200,200) -> map (200,800)
        assert_eq!(c.hit_test(100.0, 100.0), Some(0));
        // 15 screen pixels is 30 map units at this scale
        assert_eq!(c.hit_test(114.0, 100.0), Some(0));
        assert_eq!(c.hit_test(116.0, 100.0), None);
    }

    #[test]
    fn test_click_selects_in_place_and_opens_popup() {
        let mut c = controller();
        c.transform.set_state(ViewportState::new(0.5, 0.0, 0.0));
        let before = c.transform().state();
        let fx = c.click(100.0, 100.0, 0.0);
        assert!(fx.schedule_frame);
        assert!(fx.ui_changed);
        assert_eq!(c.selection().selected(), Some(0));
        assert!(c.popup().needs_measure());
        assert_eq!(c.transform().state(), before);

        c.place_popup((200.0, 60.0));
        let placement = c.popup().placement().unwrap();
        assert!((placement.left - 112.0).abs() < 1e-9);
        assert!((placement.top - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_click_miss_clears_everything() {
        let mut c = controller();
        c.transform.set_state(ViewportState::new(0.5, 0.0, 0.0));
        c.click(100.0, 100.0, 0.0);
        c.click(400.0, 20.0, 0.0);
        assert_eq!(c.selection().mode(), SelectionMode::Idle);
        assert!(!c.popup().is_visible());
    }

    #[test]
    fn test_drag_does_not_deselect() {
        let mut c = controller();
        c.transform.set_state(ViewportState::new(0.5, 0.0, 0.0));
        c.click(100.0, 100.0, 0.0);
        c.pointer_down(400.0, 20.0);
        c.pointer_move(420.0, 20.0);
        let fx = c.pointer_up();
        assert!(fx.expire_click_later);
        c.click(420.0, 20.0, 0.0);
        assert_eq!(c.selection().selected(), Some(0));
    }

    #[test]
    fn test_drag_pans_and_dismisses_popup_but_keeps_selection() {
        let mut c = controller();
        c.transform.set_state(ViewportState::new(2.0, -200.0, -1200.0));
        let (sx, sy) = c.transform().map_to_screen(600.0, 600.0);
        c.click(sx, sy, 0.0);
        assert_eq!(c.selection().selected(), Some(1));

        c.pointer_down(400.0, 250.0);
        let mut x = 400.0;
        for _ in 0..27 {
            x -= 10.0;
            c.pointer_move(x, 250.0);
        }
        assert!(!c.popup().is_visible());
        assert_eq!(c.selection().selected(), Some(1));
        assert!((c.transform().offset().0 + 470.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_batches_into_frame() {
        let mut c = controller();
        let fx = c.wheel(-100.0, WheelDeltaMode::Pixel, 400.0, 250.0);
        assert!(fx.schedule_frame);
        assert!(fx.prevent_default);
        let fx = c.wheel(-100.0, WheelDeltaMode::Pixel, 400.0, 250.0);
        assert!(!fx.schedule_frame);
        // Scale only changes once the frame flushes the batch
        assert!((c.transform().scale() - 0.5).abs() < 1e-9);
        let out = c.frame(0.0);
        assert!(!out.schedule_next);
        assert!((c.transform().scale() - (0.5 + 0.09 * 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_dismisses_popup() {
        let mut c = controller();
        c.transform.set_state(ViewportState::new(0.5, 0.0, 0.0));
        c.click(100.0, 100.0, 0.0);
        for _ in 0..12 {
            c.zoom_in();
        }
        // 0.5 + 12 * 0.0405 = 0.986, ratio 1.97
        assert!(!c.popup().is_visible());
        assert_eq!(c.selection().selected(), Some(0));
    }

    #[test]
    fn test_search_then_commit_flies_and_opens_popup() {
        let mut c = controller();
        c.search_focus();
        c.search_input("5");
        let fx = c.run_search();
        assert!(fx.ui_changed);
        assert_eq!(c.search().results(), &[0, 1, 3]);
        assert_eq!(c.selection().mode(), SelectionMode::Searching);
        assert_eq!(c.selection().beacon(), Some("n1"));

        c.key(Key::ArrowDown, 0.0);
        assert_eq!(c.selection().beacon(), Some("n2"));

        let fx = c.key(Key::Enter, 0.0);
        assert!(fx.prevent_default);
        assert_eq!(c.selection().selected(), Some(1));
        assert_eq!(c.selection().beacon(), None);
        assert_eq!(c.selection().highlighted(), None);
        assert!(c.search().results().is_empty());
        assert!(c.is_flying());
        assert!(!c.popup().is_visible());

        let now = run_frames(&mut c, 0.0, 40);
        assert!(!c.is_flying());
        assert!(c.popup().needs_measure());
        // The selection pulse keeps the loop alive
        assert!(c.frame(now).schedule_next);

        let (sx, sy) = c.transform().map_to_screen(600.0, 600.0);
        assert!((c.transform().scale() - 1.5).abs() < 1e-9);
        assert!((sx - 400.0).abs() < 1e-6);
        assert!((sy - 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_flight_is_timed_from_commit() {
        let mut c = controller();
        c.search_focus();
        c.search_input("dock 51");
        c.run_search();
        c.key(Key::Enter, 1000.0);
        assert_eq!(c.selection().selected(), Some(1));
        // A first frame 500ms after the commit already lands
        let out = c.frame(1500.0);
        assert!(out.ui_changed);
        assert!(!c.is_flying());
        assert!(c.popup().needs_measure());
        assert!((c.transform().scale() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_id_less_nodes_never_share_a_beacon() {
        let nodes = crate::dataset::parse_nodes(
            r#"[{"name":"Dock 5","x":200,"y":800},{"name":"Road","x":700,"y":300},{"id":"z","name":"Yard","x":400,"y":400}]"#,
        )
        .unwrap();
        assert_eq!(nodes[0].id, "");
        let mut c = MapController::new(
            ViewerConfig::default(),
            MapAsset::new(1000, 1000),
            nodes,
            (800.0, 500.0),
        );
        c.search_input("dock");
        c.run_search();
        assert_eq!(c.selection().highlighted(), Some(0));
        assert_eq!(c.selection().beacon(), None);
        assert!(!c.selection().is_beaconed(&c.nodes()[1].id));
        assert!(!c.frame(0.0).schedule_next);

        let mut target = Recorder::default();
        c.render(&mut target, None, 0.0);
        // Only the matched marker is drawn enlarged and nothing pulses
        let arcs = target.arcs();
        assert_eq!(arcs.len(), 3);
        let enlarged = arcs
            .iter()
            .filter(|(_, _, r)| (*r - c.config().highlighted_radius).abs() < 1e-9)
            .count();
        assert_eq!(enlarged, 1);
    }

    #[test]
    fn test_cancelled_frames_allow_a_fresh_request() {
        let mut c = controller();
        assert!(c.request_redraw().schedule_frame);
        assert!(!c.request_redraw().schedule_frame);
        c.frames_cancelled();
        assert!(c.request_redraw().schedule_frame);
    }

    #[test]
    fn test_new_search_keeps_selection_and_beacons_top() {
        let mut c = controller();
        c.select_in_place(2);
        c.search_input("dock");
        c.run_search();
        assert_eq!(c.selection().selected(), Some(2));
        assert_eq!(c.selection().beacon(), Some("n1"));
        // Empty query clears the beacon again
        c.search_input("  ");
        c.run_search();
        assert_eq!(c.selection().beacon(), None);
        assert_eq!(c.selection().mode(), SelectionMode::Selected);
    }

    #[test]
    fn test_loop_stops_when_nothing_pulses() {
        let mut c = controller();
        c.search_input("road");
        let fx = c.run_search();
        assert!(fx.schedule_frame);
        assert!(c.frame(0.0).schedule_next);
        c.clear_search();
        assert!(!c.frame(16.0).schedule_next);
        // Next request schedules a fresh frame
        assert!(c.request_redraw().schedule_frame);
    }

    #[test]
    fn test_escape_hides_popup_and_search_keeps_selection() {
        let mut c = controller();
        c.select_in_place(0);
        c.search_focus();
        c.search_input("road");
        c.run_search();
        let fx = c.key(Key::Escape, 0.0);
        assert!(fx.blur_search);
        assert!(!fx.prevent_default);
        assert!(!c.popup().is_visible());
        assert_eq!(c.search().input(), "");
        assert_eq!(c.selection().beacon(), None);
        assert_eq!(c.selection().selected(), Some(0));
        assert!(!c.is_search_focused());
    }

    #[test]
    fn test_map_keys_ignored_while_typing() {
        let mut c = controller();
        c.search_focus();
        assert_eq!(c.key(Key::Character("+"), 0.0), Effects::default());
        c.search_blur();
        assert!(c.key(Key::Character("+"), 0.0).prevent_default);
        assert!(c.transform().scale() > 0.5);
        assert!(c.key(Key::Character("/"), 0.0).focus_search);
        assert!(c.key(Key::Character("?"), 0.0).ui_changed);
        assert!(c.is_help_visible());
    }

    #[test]
    fn test_escape_closes_help() {
        let mut c = controller();
        c.key(Key::Character("?"), 0.0);
        assert!(c.is_help_visible());
        let fx = c.key(Key::Escape, 0.0);
        assert!(fx.ui_changed);
        assert!(!fx.prevent_default);
        assert!(!c.is_help_visible());
    }

    #[test]
    fn test_arrows_without_results_do_nothing() {
        let mut c = controller();
        c.search_focus();
        let fx = c.key(Key::ArrowDown, 0.0);
        assert!(!fx.prevent_default);
        assert_eq!(c.selection().mode(), SelectionMode::Idle);
    }

    #[test]
    fn test_reset_view_clears_state() {
        let mut c = controller();
        c.search_input("dock");
        c.run_search();
        c.select_in_place(1);
        c.zoom_in();
        c.reset_view();
        assert_eq!(c.selection().mode(), SelectionMode::Idle);
        assert!(!c.popup().is_visible());
        assert!(c.search().input().is_empty());
        assert!((c.transform().scale() - 0.5).abs() < 1e-9);
        assert!((c.transform().offset().0 - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_tap_selects_and_swallows_click() {
        let mut c = controller();
        c.transform.set_state(ViewportState::new(0.5, 0.0, 0.0));
        c.touch_start(&[(100.0, 100.0)], 0.0);
        let fx = c.touch_end(&[], Some((100.0, 100.0)), 120.0);
        assert!(fx.expire_click_later);
        assert_eq!(c.selection().selected(), Some(0));
        // The synthetic click that follows must not toggle anything
        c.click(300.0, 300.0, 0.0);
        assert_eq!(c.selection().selected(), Some(0));
    }

    #[test]
    fn test_pinch_zooms_at_midpoint() {
        let mut c = controller();
        c.touch_start(&[(300.0, 200.0)], 0.0);
        c.touch_start(&[(300.0, 200.0), (500.0, 200.0)], 5.0);
        c.touch_move(&[(250.0, 200.0), (550.0, 200.0)]);
        // ratio 1.5 -> delta 0.165 -> eased 0.1485
        assert!((c.transform().scale() - 0.6485).abs() < 1e-9);
        assert!(!c.touch_end(&[], Some((250.0, 200.0)), 50.0).expire_click_later);
    }

    #[test]
    fn test_result_press_hold_commits() {
        let mut c = controller();
        c.search_focus();
        c.search_input("dock");
        c.run_search();
        c.result_hover(1);
        assert_eq!(c.selection().beacon(), Some("n2"));
        c.search_blur();
        c.result_press_start(1, 10.0, 10.0);
        assert_eq!(c.search_blur_elapsed(), Effects::default());
        assert!(c.search().is_list_visible());
        c.result_press_end(1, 0.0);
        assert_eq!(c.selection().selected(), Some(1));
        assert!(c.is_flying());
        assert_eq!(c.result_click(1, 0.0), Effects::default());
    }

    #[test]
    fn test_outside_press_blurs_search() {
        let mut c = controller();
        c.search_focus();
        c.search_input("dock");
        c.run_search();
        let fx = c.outside_pointer_down();
        assert!(fx.blur_search);
        assert!(!c.search().is_list_visible());
        assert_eq!(c.outside_pointer_down(), Effects::default());
    }

    #[test]
    fn test_resize_requests_level_rebuild_on_min_scale_change() {
        let mut c = controller();
        assert!(c.resize(800.0, 600.0).rebuild_levels);
        assert!(!c.resize(1000.0, 600.0).rebuild_levels);
    }

    #[test]
    fn test_render_draws_visible_nodes() {
        let c = controller();
        let raster = MapRaster::new(MapAsset::new(1000, 1000), "map");
        let mut target = Recorder::default();
        let stats = c.render(&mut target, Some(&raster), 0.0);
        assert_eq!(stats.drawn, 4);
    }
}
