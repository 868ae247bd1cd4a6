use dioxus::html::geometry::{ClientPoint, WheelDelta};
use dioxus::html::input_data::MouseButton;
use dioxus::core::schedule_update;
use dioxus::prelude::*;
use factory_map_shared::gesture::{Point, WheelDeltaMode};
use factory_map_shared::{Effects, Node, ViewerConfig};

use crate::components::help_overlay::HelpOverlay;
use crate::components::node_popup::NodePopup;
use crate::components::search_panel::SearchPanel;
use crate::components::zoom_controls::ZoomControls;
use crate::frame::now_ms;
use crate::pages::viewer::LoadedRaster;
use crate::session::{ViewerSession, MAP_CANVAS_ID};

/// Wheel delta and the unit it is expressed in.
fn wheel_input(delta: WheelDelta) -> (f64, WheelDeltaMode) {
    match delta {
        WheelDelta::Pixels(d) => (d.y, WheelDeltaMode::Pixel),
        WheelDelta::Lines(d) => (d.y, WheelDeltaMode::Line),
        WheelDelta::Pages(d) => (d.y, WheelDeltaMode::Page),
    }
}

/// The canvas fills the window, so client coordinates are canvas coordinates.
fn client_points(points: impl IntoIterator<Item = ClientPoint>) -> Vec<Point> {
    points.into_iter().map(|p| (p.x, p.y)).collect()
}

fn container_class(dragging: bool) -> &'static str {
    if dragging {
        "map-container grabbing"
    } else {
        "map-container"
    }
}

#[component]
pub fn MapView(raster: LoadedRaster, nodes: Vec<Node>) -> Element {
    let refresh = use_hook(schedule_update);
    let session = use_hook(|| {
        ViewerSession::new(ViewerConfig::default(), &raster, nodes.clone(), refresh.clone())
    });

    use_drop({
        let session = session.clone();
        move || {
            if let Some(session) = &session {
                session.stop();
            }
        }
    });

    let Some(session) = session else {
        return rsx! {
            div { class: "loading-overlay error",
                p { class: "error-message", "This browser cannot display the map." }
            }
        };
    };

    let revision = session.revision();
    let dragging = session.with(|c| c.is_dragging());

    // --- mouse ---

    let on_mounted = {
        let session = session.clone();
        move |_: Event<MountedData>| session.start()
    };

    let on_mouse_down = {
        let session = session.clone();
        move |evt: Event<MouseData>| {
            if evt.trigger_button() != Some(MouseButton::Primary) {
                return;
            }
            let p = evt.client_coordinates();
            if session.dispatch(|c| c.pointer_down(p.x, p.y)) {
                evt.prevent_default();
            }
            session.refresh();
        }
    };

    let on_mouse_move = {
        let session = session.clone();
        move |evt: Event<MouseData>| {
            let p = evt.client_coordinates();
            session.dispatch(|c| c.pointer_move(p.x, p.y));
        }
    };

    let on_mouse_up = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            let was_dragging = session.with(|c| c.is_dragging());
            session.dispatch(|c| c.pointer_up());
            if was_dragging {
                session.refresh();
            }
        }
    };

    // Leaving the canvas ends a drag like a release does.
    let on_mouse_leave = on_mouse_up.clone();

    let on_click = {
        let session = session.clone();
        move |evt: Event<MouseData>| {
            let p = evt.client_coordinates();
            session.dispatch(|c| c.click(p.x, p.y, now_ms()));
        }
    };

    let on_wheel = {
        let session = session.clone();
        move |evt: Event<WheelData>| {
            let (delta_y, mode) = wheel_input(evt.data().delta());
            let p = evt.data().client_coordinates();
            if session.dispatch(|c| c.wheel(delta_y, mode, p.x, p.y)) {
                evt.prevent_default();
            }
        }
    };

    // --- touch ---

    let on_touch_start = {
        let session = session.clone();
        move |evt: Event<TouchData>| {
            let touches = client_points(evt.data().touches().iter().map(|t| t.client_coordinates()));
            if session.dispatch(|c| c.touch_start(&touches, now_ms())) {
                evt.prevent_default();
            }
        }
    };

    let on_touch_move = {
        let session = session.clone();
        move |evt: Event<TouchData>| {
            let touches = client_points(evt.data().touches().iter().map(|t| t.client_coordinates()));
            if session.dispatch(|c| c.touch_move(&touches)) {
                evt.prevent_default();
            }
        }
    };

    let on_touch_end = {
        let session = session.clone();
        move |evt: Event<TouchData>| {
            let remaining = client_points(evt.data().touches().iter().map(|t| t.client_coordinates()));
            let lifted = client_points(
                evt.data()
                    .touches_changed()
                    .iter()
                    .map(|t| t.client_coordinates()),
            )
            .first()
            .copied();
            if session.dispatch(|c| c.touch_end(&remaining, lifted, now_ms())) {
                evt.prevent_default();
            }
        }
    };

    let on_touch_cancel = {
        let session = session.clone();
        move |_: Event<TouchData>| {
            session.dispatch(|c| {
                c.touch_cancel();
                Effects::default()
            });
        }
    };

    rsx! {
        div { class: container_class(dragging),
            canvas {
                id: MAP_CANVAS_ID,
                onmounted: on_mounted,
                onmousedown: on_mouse_down,
                onmousemove: on_mouse_move,
                onmouseup: on_mouse_up,
                onmouseleave: on_mouse_leave,
                onclick: on_click,
                onwheel: on_wheel,
                ontouchstart: on_touch_start,
                ontouchmove: on_touch_move,
                ontouchend: on_touch_end,
                ontouchcancel: on_touch_cancel,
                oncontextmenu: move |evt: Event<MouseData>| evt.prevent_default(),
            }

            SearchPanel { session: session.clone(), revision }
            ZoomControls { session: session.clone() }
            NodePopup { session: session.clone(), revision }
            HelpOverlay { session: session.clone(), revision }
        }
    }
}
