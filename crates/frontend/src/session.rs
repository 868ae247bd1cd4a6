//! Glue between the DOM and the viewer core.
//!
//! A [`ViewerSession`] owns the [`MapController`], the raster with its
//! resolution levels, the animation-frame loop and the window/document
//! listeners. Every input goes through [`ViewerSession::dispatch`], which
//! carries out the [`Effects`] the controller asks for.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use dioxus::logger::tracing::debug;
use factory_map_shared::cache::MapRaster;
use factory_map_shared::gesture::Key;
use factory_map_shared::{Effects, MapController, Node, ViewerConfig};
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlCanvasElement, HtmlElement, KeyboardEvent, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

use crate::canvas::{context_2d, CanvasImage, CanvasTarget, LevelCanvasFactory};
use crate::frame::{now_ms, FrameDriver, Subscription};
use crate::pages::viewer::LoadedRaster;

pub const MAP_CANVAS_ID: &str = "map-canvas";
pub const SEARCH_INPUT_ID: &str = "search-input";
pub const NODE_POPUP_ID: &str = "node-info";
/// Presses inside these keep the search box open.
const SEARCH_AREA_SELECTOR: &str = ".search-container, #search-results";

const SEARCH_DEBOUNCE_MS: u32 = 300;
const SEARCH_BLUR_GRACE_MS: u32 = 120;

/// Element id of a search result row.
pub fn result_row_id(row: usize) -> String {
    format!("search-result-{row}")
}

/// Re-renders the component tree that displays the overlay UI.
pub type Refresh = Arc<dyn Fn() + Send + Sync>;

struct SessionInner {
    controller: RefCell<MapController>,
    raster: RefCell<MapRaster<CanvasImage>>,
    levels: RefCell<LevelCanvasFactory>,
    document: Document,
    frames: RefCell<Option<FrameDriver>>,
    subscriptions: RefCell<Vec<Subscription>>,
    search_debounce: RefCell<Option<Timeout>>,
    revision: Cell<u64>,
    refresh: Refresh,
}

/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct ViewerSession {
    inner: Rc<SessionInner>,
}

impl PartialEq for ViewerSession {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ViewerSession {
    /// Returns `None` outside a browser document.
    pub fn new(config: ViewerConfig, raster: &LoadedRaster, nodes: Vec<Node>, refresh: Refresh) -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let viewport = window_size(&window);

        let asset = raster.info.asset();
        let controller = MapController::new(config, asset, nodes, viewport);
        let original = CanvasImage::Image(raster.image.clone());

        let inner = Rc::new(SessionInner {
            controller: RefCell::new(controller),
            raster: RefCell::new(MapRaster::new(asset, original)),
            levels: RefCell::new(LevelCanvasFactory::new(document.clone(), raster.image.clone())),
            document,
            frames: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
            search_debounce: RefCell::new(None),
            revision: Cell::new(0),
            refresh,
        });

        let weak = Rc::downgrade(&inner);
        *inner.frames.borrow_mut() = Some(FrameDriver::new(move |timestamp| {
            match weak.upgrade() {
                Some(inner) => ViewerSession { inner }.tick(timestamp),
                None => false,
            }
        }));

        Some(Self { inner })
    }

    fn downgrade(&self) -> Weak<SessionInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<SessionInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Bumped whenever the overlay UI needs to re-render.
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Read-only access to the core for rendering the overlay UI.
    pub fn with<R>(&self, f: impl FnOnce(&MapController) -> R) -> R {
        f(&self.inner.controller.borrow())
    }

    /// Run an input through the controller and carry out its effects.
    /// Returns whether the originating DOM event should be default-prevented.
    pub fn dispatch(&self, f: impl FnOnce(&mut MapController) -> Effects) -> bool {
        let effects = f(&mut self.inner.controller.borrow_mut());
        self.apply(effects)
    }

    fn apply(&self, effects: Effects) -> bool {
        if effects.rebuild_levels {
            self.rebuild_levels();
        }
        if effects.schedule_frame {
            self.request_frame();
        }
        if effects.focus_search {
            if let Some(input) = self.html_element(SEARCH_INPUT_ID) {
                let _ = input.focus();
            }
        }
        if effects.blur_search {
            if let Some(input) = self.html_element(SEARCH_INPUT_ID) {
                let _ = input.blur();
            }
        }
        if effects.expire_click_later {
            let weak = self.downgrade();
            Timeout::new(0, move || {
                if let Some(session) = Self::upgrade(&weak) {
                    session.inner.controller.borrow_mut().expire_click_suppression();
                }
            })
            .forget();
        }
        if effects.ui_changed {
            self.refresh();
        }
        effects.prevent_default
    }

    pub fn refresh(&self) {
        self.inner.revision.set(self.inner.revision.get().wrapping_add(1));
        (self.inner.refresh)();
    }

    fn request_frame(&self) {
        if let Some(frames) = self.inner.frames.borrow().as_ref() {
            frames.request();
        }
    }

    fn html_element(&self, id: &str) -> Option<HtmlElement> {
        self.inner
            .document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.inner
            .document
            .get_element_by_id(MAP_CANVAS_ID)
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    }

    // --- lifecycle ---

    /// The canvas is in the DOM: size it, build levels, attach the window
    /// and document listeners and draw the first frame.
    pub fn start(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let (width, height) = window_size(&window);
        self.size_canvas(width, height);
        self.rebuild_levels();

        let mut subscriptions = Vec::new();
        let weak = self.downgrade();
        subscriptions.extend(Subscription::new(&window, "resize", move |_: web_sys::Event| {
            if let Some(session) = Self::upgrade(&weak) {
                session.on_resize();
            }
        }));
        let weak = self.downgrade();
        subscriptions.extend(Subscription::new(&self.inner.document, "keydown", move |event: KeyboardEvent| {
            if let Some(session) = Self::upgrade(&weak) {
                session.on_key(&event);
            }
        }));
        for event in ["mousedown", "touchstart"] {
            let weak = self.downgrade();
            subscriptions.extend(Subscription::new(&self.inner.document, event, move |event: web_sys::Event| {
                if let Some(session) = Self::upgrade(&weak) {
                    session.on_document_press(&event);
                }
            }));
        }
        *self.inner.subscriptions.borrow_mut() = subscriptions;

        self.dispatch(|c| c.request_redraw());
        dioxus::logger::tracing::info!("Factory map initialized successfully");
    }

    /// Detach every listener and stop the frame loop.
    pub fn stop(&self) {
        self.inner.subscriptions.borrow_mut().clear();
        self.inner.frames.borrow_mut().take();
        self.inner.controller.borrow_mut().frames_cancelled();
        self.inner.search_debounce.borrow_mut().take();
    }

    fn size_canvas(&self, width: f64, height: f64) {
        if let Some(canvas) = self.canvas() {
            canvas.set_width(width.max(0.0) as u32);
            canvas.set_height(height.max(0.0) as u32);
        }
    }

    fn rebuild_levels(&self) {
        let (min_scale, span, step) = self.with(|c| {
            (
                c.transform().min_scale(),
                c.config().level_span,
                c.config().level_step,
            )
        });
        let mut levels = self.inner.levels.borrow_mut();
        self.inner
            .raster
            .borrow_mut()
            .rebuild_levels(&mut *levels, min_scale, span, step);
    }

    // --- frames ---

    fn tick(&self, timestamp: f64) -> bool {
        let outcome = self.inner.controller.borrow_mut().frame(timestamp);
        self.draw(timestamp);

        let mut effects = Effects {
            ui_changed: outcome.ui_changed,
            ..Effects::default()
        };
        if self.with(|c| c.popup().needs_measure()) {
            if let Some(size) = self.measure_popup() {
                effects |= self.inner.controller.borrow_mut().place_popup(size);
            }
        }
        self.apply(effects);
        outcome.schedule_next
    }

    fn draw(&self, now: f64) {
        let Some(ctx) = self.canvas().as_ref().and_then(context_2d) else {
            return;
        };
        let raster = self.inner.raster.borrow();
        let stats = self.with(|c| c.render(&mut CanvasTarget::new(&ctx), Some(&raster), now));
        if stats.capped > 0 {
            debug!(drawn = stats.drawn, capped = stats.capped, "Node cap reached");
        }
    }

    /// Size of the hidden popup once it is laid out. `None` until the
    /// element exists.
    fn measure_popup(&self) -> Option<(f64, f64)> {
        let popup = self.html_element(NODE_POPUP_ID)?;
        Some((popup.offset_width() as f64, popup.offset_height() as f64))
    }

    // --- window and document events ---

    fn on_resize(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let (width, height) = window_size(&window);
        self.size_canvas(width, height);
        self.dispatch(|c| c.resize(width, height));
    }

    fn on_key(&self, event: &KeyboardEvent) {
        let key = event.key();
        let moved_cursor = matches!(Key::from_dom(&key), Key::ArrowUp | Key::ArrowDown);
        if self.dispatch(|c| c.key(Key::from_dom(&key), now_ms())) {
            event.prevent_default();
        }
        if moved_cursor {
            self.scroll_cursor_into_view();
        }
    }

    fn on_document_press(&self, event: &web_sys::Event) {
        let inside = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(SEARCH_AREA_SELECTOR).ok().flatten())
            .is_some();
        if !inside {
            self.dispatch(|c| c.outside_pointer_down());
        }
    }

    fn scroll_cursor_into_view(&self) {
        let Some(row) = self.with(|c| c.search().cursor()) else {
            return;
        };
        if let Some(el) = self.inner.document.get_element_by_id(&result_row_id(row)) {
            let options = ScrollIntoViewOptions::new();
            options.set_block(ScrollLogicalPosition::Nearest);
            el.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }

    // --- search box timers ---

    /// Text changed: update the box now, search once typing pauses.
    pub fn search_typed(&self, text: &str) {
        self.dispatch(|c| c.search_input(text));
        let weak = self.downgrade();
        let timer = Timeout::new(SEARCH_DEBOUNCE_MS, move || {
            if let Some(session) = Self::upgrade(&weak) {
                session.dispatch(|c| c.run_search());
            }
        });
        // Replacing the previous timer cancels it.
        *self.inner.search_debounce.borrow_mut() = Some(timer);
    }

    /// Input lost focus: hide the results after a grace period so a click
    /// on a row still lands.
    pub fn search_blurred(&self) {
        self.dispatch(|c| c.search_blur());
        let weak = self.downgrade();
        Timeout::new(SEARCH_BLUR_GRACE_MS, move || {
            if let Some(session) = Self::upgrade(&weak) {
                session.dispatch(|c| c.search_blur_elapsed());
            }
        })
        .forget();
    }

    pub fn clear_search(&self) {
        self.inner.search_debounce.borrow_mut().take();
        self.dispatch(|c| c.clear_search());
    }
}

fn window_size(window: &web_sys::Window) -> (f64, f64) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_row_id() {
        assert_eq!(result_row_id(0), "search-result-0");
        assert_eq!(result_row_id(9), "search-result-9");
    }
}
