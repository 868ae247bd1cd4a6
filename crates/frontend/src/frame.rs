//! Owned handles on browser callbacks: the animation-frame loop and DOM
//! event listeners. Dropping a handle unregisters it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Milliseconds on the same clock as animation-frame timestamps.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Calls `tick` on the next animation frame whenever [`FrameDriver::request`]
/// is called, and again on every following frame while `tick` returns `true`.
/// At most one frame is ever pending.
pub struct FrameDriver {
    callback: Rc<RefCell<Option<FrameCallback>>>,
    pending: Rc<Cell<Option<i32>>>,
}

impl FrameDriver {
    pub fn new(mut tick: impl FnMut(f64) -> bool + 'static) -> Self {
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
        let pending = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&callback);
        let pending_in_frame = pending.clone();
        let closure = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            pending_in_frame.set(None);
            if tick(timestamp) {
                if let Some(callback) = weak.upgrade() {
                    request_frame(&callback, &pending_in_frame);
                }
            }
        });
        *callback.borrow_mut() = Some(closure);

        Self { callback, pending }
    }

    pub fn request(&self) {
        request_frame(&self.callback, &self.pending);
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        if let (Some(id), Some(window)) = (self.pending.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
    }
}

fn request_frame(callback: &RefCell<Option<FrameCallback>>, pending: &Cell<Option<i32>>) {
    if pending.get().is_some() {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = callback.borrow();
    let Some(callback) = callback.as_ref() else {
        return;
    };
    if let Ok(id) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        pending.set(Some(id));
    }
}

/// A DOM event listener that is removed when the subscription is dropped.
pub struct Subscription {
    target: EventTarget,
    event: &'static str,
    listener: Closure<dyn FnMut(Event)>,
}

impl Subscription {
    /// Listen for `event` on `target`. Events that are not an `E` are ignored.
    pub fn new<E>(target: &EventTarget, event: &'static str, mut handler: impl FnMut(E) + 'static) -> Option<Self>
    where
        E: JsCast,
    {
        let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        });
        target
            .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target: target.clone(),
            event,
            listener,
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.listener.as_ref().unchecked_ref());
    }
}
