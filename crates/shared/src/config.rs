use serde::Deserialize;

/// Tunables for the viewer core.
///
/// Every field has a default, so hosts can deserialize a partial JSON
/// object and only override what they care about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Upper zoom bound. The lower bound is derived from the viewport.
    pub max_scale: f64,
    /// Scale delta applied per zoom button / key press and per full wheel notch.
    pub zoom_speed: f64,
    pub node_radius: f64,
    pub highlighted_radius: f64,
    /// Click/tap hit radius in screen pixels (never smaller than `node_radius`).
    pub hit_radius_px: f64,
    /// Scale the camera flies to when a node is focused.
    pub focus_scale: f64,
    pub focus_duration_ms: f64,
    /// Route canvas clicks through the camera flight instead of selecting in place.
    pub fly_to_clicked_node: bool,
    /// Cumulative pan distance after which an open popup is dismissed.
    pub popup_dismiss_pan_px: f64,
    /// Relative zoom change (either direction) after which a popup is dismissed.
    pub popup_dismiss_zoom_ratio: f64,
    /// Resolution levels span `[min_scale, min_scale * level_span]`.
    pub level_span: f64,
    pub level_step: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_scale: 3.0,
            zoom_speed: 0.045,
            node_radius: 11.0,
            highlighted_radius: 17.0,
            hit_radius_px: 15.0,
            focus_scale: 1.5,
            focus_duration_ms: 500.0,
            fly_to_clicked_node: false,
            popup_dismiss_pan_px: 260.0,
            popup_dismiss_zoom_ratio: 1.8,
            level_span: 1.6,
            level_step: 1.07,
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON override object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Largest marker radius, used to pad the culling rectangle.
    pub fn max_marker_radius(&self) -> f64 {
        self.node_radius.max(self.highlighted_radius)
    }

    /// Camera target scale, never above `max_scale`.
    pub fn focus_target_scale(&self) -> f64 {
        self.focus_scale.min(self.max_scale)
    }
}
