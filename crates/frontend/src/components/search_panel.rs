use dioxus::prelude::*;
use factory_map_shared::search::{highlight_segments, Segment};
use factory_map_shared::Node;

use crate::frame::now_ms;
use crate::session::{result_row_id, ViewerSession, SEARCH_INPUT_ID};

/// One results-list row, pre-split into highlighted runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub name: Vec<Segment>,
    pub description: Option<Vec<Segment>>,
}

impl ResultRow {
    pub fn new(node: &Node, query: &str) -> Self {
        Self {
            name: highlight_segments(&node.name, query),
            description: node
                .has_description()
                .then(|| highlight_segments(node.description_text(), query)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SearchView {
    input: String,
    show_clear: bool,
    list_visible: bool,
    no_results: bool,
    cursor: Option<usize>,
    rows: Vec<ResultRow>,
}

/// Search box, clear button and results list. Re-renders when `revision` moves.
#[component]
pub fn SearchPanel(session: ViewerSession, revision: u64) -> Element {
    let _ = revision;
    let view = session.with(|c| {
        let search = c.search();
        SearchView {
            input: search.input().to_string(),
            show_clear: search.show_clear_button(),
            list_visible: search.is_list_visible(),
            no_results: search.shows_no_results(),
            cursor: search.cursor(),
            rows: search
                .results()
                .iter()
                .filter_map(|&index| c.node(index))
                .map(|node| ResultRow::new(node, search.query()))
                .collect(),
        }
    });

    let on_input = {
        let session = session.clone();
        move |evt: Event<FormData>| session.search_typed(&evt.value())
    };
    let on_focus = {
        let session = session.clone();
        move |_: Event<FocusData>| {
            session.dispatch(|c| c.search_focus());
        }
    };
    let on_blur = {
        let session = session.clone();
        move |_: Event<FocusData>| session.search_blurred()
    };
    let on_clear = {
        let session = session.clone();
        move |_: Event<MouseData>| session.clear_search()
    };

    rsx! {
        div { class: "search-container",
            input {
                id: SEARCH_INPUT_ID,
                class: "search-input",
                r#type: "text",
                placeholder: "Search nodes...",
                autocomplete: "off",
                spellcheck: "false",
                value: "{view.input}",
                oninput: on_input,
                onfocus: on_focus,
                onblur: on_blur,
            }
            if view.show_clear {
                button {
                    class: "clear-search",
                    title: "Clear search",
                    onclick: on_clear,
                    "×"
                }
            }
        }

        if view.list_visible {
            div { id: "search-results", class: "search-results",
                if view.no_results {
                    div { class: "search-result-item empty",
                        small { "No results found" }
                    }
                }
                for (row, result) in view.rows.into_iter().enumerate() {
                    ResultItem {
                        key: "{row}",
                        session: session.clone(),
                        row,
                        result,
                        active: view.cursor == Some(row),
                    }
                }
            }
        }
    }
}

#[component]
fn ResultItem(session: ViewerSession, row: usize, result: ResultRow, active: bool) -> Element {
    let on_enter = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.result_hover(row));
        }
    };
    let on_down = {
        let session = session.clone();
        move |evt: Event<MouseData>| {
            let p = evt.client_coordinates();
            session.dispatch(|c| {
                c.result_press_start(row, p.x, p.y);
                Default::default()
            });
        }
    };
    let on_move = {
        let session = session.clone();
        move |evt: Event<MouseData>| {
            let p = evt.client_coordinates();
            session.dispatch(|c| {
                c.result_press_move(p.x, p.y);
                Default::default()
            });
        }
    };
    let on_up = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.result_press_end(row, now_ms()));
        }
    };
    let on_leave = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| {
                c.result_press_leave();
                Default::default()
            });
        }
    };
    let on_click = {
        let session = session.clone();
        move |_: Event<MouseData>| {
            session.dispatch(|c| c.result_click(row, now_ms()));
        }
    };

    rsx! {
        div {
            id: result_row_id(row),
            class: if active { "search-result-item selected" } else { "search-result-item" },
            onmouseenter: on_enter,
            onmousedown: on_down,
            onmousemove: on_move,
            onmouseup: on_up,
            onmouseleave: on_leave,
            onclick: on_click,

            strong { Highlighted { segments: result.name } }
            if let Some(description) = result.description {
                small { Highlighted { segments: description } }
            }
        }
    }
}

#[component]
fn Highlighted(segments: Vec<Segment>) -> Element {
    rsx! {
        for segment in segments {
            if segment.matched {
                mark { "{segment.text}" }
            } else {
                "{segment.text}"
            }
        }
    }
}
