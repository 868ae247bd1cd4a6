use dioxus::prelude::*;

use crate::session::ViewerSession;

#[component]
pub fn ZoomControls(session: ViewerSession) -> Element {
    let zoom_in = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.zoom_in());
        }
    };
    let zoom_out = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.zoom_out());
        }
    };
    let reset = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.reset_view());
        }
    };
    let help = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.toggle_help());
        }
    };

    rsx! {
        div { class: "zoom-controls",
            button { class: "zoom-btn", title: "Zoom in (+)", onclick: zoom_in, "+" }
            button { class: "zoom-btn", title: "Zoom out (-)", onclick: zoom_out, "−" }
            button { class: "zoom-btn", title: "Reset view (0)", onclick: reset, "⟲" }
            button { class: "zoom-btn help-btn", title: "Keyboard shortcuts (?)", onclick: help, "?" }
        }
    }
}
