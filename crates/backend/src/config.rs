use std::path::PathBuf;

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the dataset and the map raster, served under `/static`.
    pub assets_dir: PathBuf,
    pub nodes_file: String,
    pub map_file: String,
    /// Built front end.
    pub dist_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            assets_dir: PathBuf::from("assets"),
            nodes_file: "nodes.json".to_string(),
            map_file: "factory-map.png".to_string(),
            dist_dir: PathBuf::from("dist"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("Invalid PORT {:?}: {}", raw, e))?,
            None => defaults.port,
        };
        Ok(Self {
            port,
            assets_dir: lookup("ASSETS_DIR").map_or(defaults.assets_dir, PathBuf::from),
            nodes_file: lookup("NODES_FILE").unwrap_or(defaults.nodes_file),
            map_file: lookup("MAP_FILE").unwrap_or(defaults.map_file),
            dist_dir: lookup("DIST_DIR").map_or(defaults.dist_dir, PathBuf::from),
        })
    }

    pub fn nodes_path(&self) -> PathBuf {
        self.assets_dir.join(&self.nodes_file)
    }

    pub fn map_path(&self) -> PathBuf {
        self.assets_dir.join(&self.map_file)
    }

    /// Public URL of the map raster.
    pub fn map_url(&self) -> String {
        format!("/static/{}", self.map_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.nodes_path(), PathBuf::from("assets/nodes.json"));
        assert_eq!(cfg.map_url(), "/static/factory-map.png");
    }

    #[test]
    fn test_overrides() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("ASSETS_DIR", "/srv/map"),
            ("MAP_FILE", "plant.jpg"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.map_path(), PathBuf::from("/srv/map/plant.jpg"));
        assert_eq!(cfg.nodes_file, "nodes.json");
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.contains("PORT"));
    }
}
