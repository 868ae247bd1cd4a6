use serde::{Deserialize, Deserializer, Serialize};

/// A point-of-interest marker.
///
/// Coordinates are in map space: origin at the bottom-left of the raster,
/// `y` growing upward. Use [`MapAsset::flip_y`] before drawing or hit-testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Description text, empty when absent.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// True when the node carries a non-blank description.
    pub fn has_description(&self) -> bool {
        !self.description_text().trim().is_empty()
    }
}

/// Ids are strings in the dataset, but authoring tools have been known to
/// emit bare numbers. Accept both.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// The source raster. Its natural pixel size defines map space `[0,W) x [0,H)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapAsset {
    pub width: u32,
    pub height: u32,
}

impl MapAsset {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f(&self) -> f64 {
        self.width as f64
    }

    pub fn height_f(&self) -> f64 {
        self.height as f64
    }

    /// Convert a bottom-left-origin `y` to the top-left-origin drawing surface.
    /// The flip is its own inverse.
    pub fn flip_y(&self, y: f64) -> f64 {
        self.height_f() - y
    }

    /// Node position on the drawing surface (top-left origin).
    pub fn surface_position(&self, node: &Node) -> (f64, f64) {
        (node.x, self.flip_y(node.y))
    }
}

/// What the server tells the viewer about the map raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    /// URL the raster is served from.
    pub image_url: String,
    pub width: u32,
    pub height: u32,
}

impl MapInfo {
    pub fn asset(&self) -> MapAsset {
        MapAsset::new(self.width, self.height)
    }
}

/// Live camera: `scale` screen pixels per map unit, and the screen position
/// of the surface origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewportState {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_deserialize_full() {
        let json = r#"{"id":"n1","name":"Dock 5","x":10.5,"y":20,"description":"cs 5"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, "n1");
        assert_eq!(node.name, "Dock 5");
        assert!((node.x - 10.5).abs() < 1e-9);
        assert!((node.y - 20.0).abs() < 1e-9);
        assert_eq!(node.description.as_deref(), Some("cs 5"));
    }

    #[test]
    fn test_node_numeric_id_and_missing_fields() {
        let node: Node = serde_json::from_str(r#"{"id":42,"x":1}"#).unwrap();
        assert_eq!(node.id, "42");
        assert_eq!(node.name, "");
        assert!((node.y - 0.0).abs() < 1e-9);
        assert!(node.description.is_none());
    }

    #[test]
    fn test_has_description_ignores_blank() {
        let blank = Node::new("a", "A", 0.0, 0.0).with_description("   ");
        assert!(!blank.has_description());
        let real = Node::new("b", "B", 0.0, 0.0).with_description("Docking point");
        assert!(real.has_description());
        assert!(!Node::new("c", "C", 0.0, 0.0).has_description());
    }

    #[test]
    fn test_flip_y_is_involution() {
        let map = MapAsset::new(1000, 800);
        assert!((map.flip_y(0.0) - 800.0).abs() < 1e-9);
        assert!((map.flip_y(map.flip_y(123.0)) - 123.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_info_wire_format() {
        let info: MapInfo =
            serde_json::from_str(r#"{"imageUrl":"/static/map.png","width":640,"height":480}"#).unwrap();
        assert_eq!(info.asset(), MapAsset::new(640, 480));
    }

    #[test]
    fn test_surface_position() {
        let map = MapAsset::new(1000, 1000);
        let node = Node::new("a", "A", 250.0, 100.0);
        assert_eq!(map.surface_position(&node), (250.0, 900.0));
    }
}
