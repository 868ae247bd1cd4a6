use factory_map_shared::dataset::parse_nodes;
use factory_map_shared::models::{MapInfo, Node};

use crate::config::ServerConfig;

/// Dataset and raster metadata, validated once at start-up.
pub struct Assets {
    pub nodes: Vec<Node>,
    pub map: MapInfo,
}

impl Assets {
    pub fn load(config: &ServerConfig) -> Result<Self, String> {
        let nodes_path = config.nodes_path();
        let nodes_data = std::fs::read_to_string(&nodes_path)
            .map_err(|e| format!("Failed to read {}: {}", nodes_path.display(), e))?;
        let nodes = parse_nodes(&nodes_data)
            .map_err(|e| format!("Failed to parse {}: {}", nodes_path.display(), e))?;

        // Only the header is decoded; enough to reject a broken asset.
        let map_path = config.map_path();
        let (width, height) = image::image_dimensions(&map_path)
            .map_err(|e| format!("Failed to read map image {}: {}", map_path.display(), e))?;
        if width == 0 || height == 0 {
            return Err(format!("Map image {} is empty", map_path.display()));
        }

        tracing::info!(nodes = nodes.len(), width, height, "Loaded map assets");

        Ok(Assets {
            nodes,
            map: MapInfo {
                image_url: config.map_url(),
                width,
                height,
            },
        })
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_assets(nodes: &str, with_image: bool) -> (tempfile::TempDir, ServerConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nodes.json"), nodes).unwrap();
        if with_image {
            image::RgbImage::new(40, 30)
                .save(dir.path().join("factory-map.png"))
                .unwrap();
        }
        let config = ServerConfig {
            assets_dir: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_load_reads_nodes_and_dimensions() {
        let (_dir, config) = write_assets(
            r#"[{"id":"a","name":"Dock 5","x":1,"y":2},{"id":"b","name":"Road","x":3,"y":4}]"#,
            true,
        );
        let assets = Assets::load(&config).unwrap();
        assert_eq!(assets.nodes.len(), 2);
        assert_eq!((assets.map.width, assets.map.height), (40, 30));
        assert_eq!(assets.map.image_url, "/static/factory-map.png");
        assert_eq!(assets.find_node("b").map(|n| n.name.as_str()), Some("Road"));
        assert!(assets.find_node("zzz").is_none());
    }

    #[test]
    fn test_invalid_json_fails() {
        let (_dir, config) = write_assets("[{", true);
        let err = Assets::load(&config).err().unwrap();
        assert!(err.contains("nodes.json"));
    }

    #[test]
    fn test_missing_image_fails() {
        let (_dir, config) = write_assets("[]", false);
        let err = Assets::load(&config).err().unwrap();
        assert!(err.contains("factory-map.png"));
    }

    #[test]
    fn test_corrupt_image_fails() {
        let (dir, config) = write_assets("[]", false);
        std::fs::write(dir.path().join("factory-map.png"), b"not a png").unwrap();
        assert!(Assets::load(&config).is_err());
    }
}
