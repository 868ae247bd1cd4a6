use dioxus::prelude::*;
use factory_map_shared::popup::PopupPlacement;

use crate::session::{ViewerSession, NODE_POPUP_ID};

/// Inline style for the popup. Until it has been measured it is laid out
/// invisibly at the origin.
fn popup_style(placement: Option<PopupPlacement>) -> String {
    match placement {
        Some(p) => format!("left: {}px; top: {}px; visibility: visible;", p.left, p.top),
        None => "left: 0px; top: 0px; visibility: hidden;".to_string(),
    }
}

/// Name and description of the selected node, anchored next to its marker.
#[component]
pub fn NodePopup(session: ViewerSession, revision: u64) -> Element {
    let _ = revision;
    let content = session.with(|c| {
        let popup = c.popup();
        if !popup.is_visible() {
            return None;
        }
        let node = c.node(popup.node()?)?;
        let description = node
            .has_description()
            .then(|| node.description_text().to_string());
        Some((node.name.clone(), description, popup.placement()))
    });

    let Some((name, description, placement)) = content else {
        return rsx! {};
    };
    let style = popup_style(placement);

    rsx! {
        div { id: NODE_POPUP_ID, class: "node-info", style: "{style}",
            h3 { "{name}" }
            if let Some(description) = description {
                p { "{description}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_style_hidden_until_placed() {
        assert!(popup_style(None).contains("visibility: hidden"));
        let style = popup_style(Some(PopupPlacement { left: 112.0, top: 8.0 }));
        assert_eq!(style, "left: 112px; top: 8px; visibility: visible;");
    }
}
