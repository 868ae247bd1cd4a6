use dioxus::prelude::*;

use crate::session::ViewerSession;

/// Keyboard and gesture reference. `revision` only drives re-rendering.
#[component]
pub fn HelpOverlay(session: ViewerSession, revision: u64) -> Element {
    let _ = revision;
    if !session.with(|c| c.is_help_visible()) {
        return rsx! {};
    }

    let close_backdrop = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.close_help());
        }
    };
    let close_button = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.close_help());
        }
    };

    rsx! {
        div {
            class: "help-overlay-backdrop",
            onclick: close_backdrop,

            div {
                class: "help-overlay",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h2 { "Help" }

                // --- Keyboard shortcuts ---

                div { class: "shortcut-section",
                    h3 { "Search" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "/" } }
                        span { "Focus the search box" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "\u{2191}" } " / " kbd { "\u{2193}" } }
                        span { "Move through results" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "Enter" } }
                        span { "Fly to the highlighted result" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "Esc" } }
                        span { "Clear search / close popup and help" }
                    }
                }

                div { class: "shortcut-section",
                    h3 { "View" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "+" } " / " kbd { "=" } }
                        span { "Zoom in" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "-" } }
                        span { "Zoom out" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "0" } }
                        span { "Reset view" }
                    }
                }

                div { class: "shortcut-section",
                    h3 { "Help" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "?" } }
                        span { "Toggle this help" }
                    }
                }

                div { class: "help-divider" }

                h2 { class: "help-section-title", "Map Interactions" }

                div { class: "help-info-section",
                    h3 { "Mouse" }
                    p { "Drag to pan and scroll to zoom around the cursor. Click a marker to show its details; click empty map to deselect." }
                }

                div { class: "help-info-section",
                    h3 { "Touch" }
                    p { "Drag with one finger to pan, pinch with two to zoom. Tap a marker to select it." }
                }

                div { class: "help-info-section",
                    h3 { "Markers" }
                    p {
                        span { class: "legend-swatch described", "\u{25cf}" } " has a description, "
                        span { class: "legend-swatch charging", "\u{25cf}" } " charging station, "
                        span { class: "legend-swatch plain", "\u{25cf}" } " no description. "
                        "The popup closes by itself once you pan or zoom far enough away."
                    }
                }

                button {
                    class: "close-help",
                    onclick: close_button,
                    "Close"
                }
            }
        }
    }
}
