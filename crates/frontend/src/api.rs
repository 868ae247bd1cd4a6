use factory_map_shared::dataset::nodes_from_value;
use factory_map_shared::{MapInfo, Node};

/// Join the page origin and an API path.
pub fn endpoint(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn api_url(path: &str) -> Result<String, String> {
    // Same origin in production; `dx serve` proxies /api in development.
    let window = web_sys::window().ok_or("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| "page origin unavailable".to_string())?;
    Ok(endpoint(&origin, path))
}

async fn get_json(path: &str) -> Result<serde_json::Value, String> {
    let resp = reqwest::Client::new()
        .get(api_url(path)?)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.status().is_success() {
        return Err(format!("GET {path} returned {}", resp.status()));
    }

    resp.json().await.map_err(|e| e.to_string())
}

/// The node dataset. Entries that do not look like nodes are skipped.
pub async fn fetch_nodes() -> Result<Vec<Node>, String> {
    let value = get_json("/api/nodes").await?;
    Ok(nodes_from_value(value))
}

/// Where the map raster lives and how big it is.
pub async fn fetch_map_info() -> Result<MapInfo, String> {
    let value = get_json("/api/map").await?;
    parse_map_info(value)
}

fn parse_map_info(value: serde_json::Value) -> Result<MapInfo, String> {
    let info: MapInfo = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if info.width == 0 || info.height == 0 {
        return Err(format!("map has no area ({}x{})", info.width, info.height));
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:3000/", "/api/nodes"),
            "http://localhost:3000/api/nodes"
        );
        assert_eq!(
            endpoint("https://factory.example", "api/map"),
            "https://factory.example/api/map"
        );
    }

    #[test]
    fn test_parse_map_info() {
        let value = serde_json::json!({"imageUrl": "/static/factory-map.png", "width": 4096, "height": 2048});
        let info = parse_map_info(value).unwrap();
        assert_eq!(info.image_url, "/static/factory-map.png");
        assert_eq!((info.width, info.height), (4096, 2048));
    }

    #[test]
    fn test_parse_map_info_rejects_empty_raster() {
        let value = serde_json::json!({"imageUrl": "/static/a.png", "width": 0, "height": 100});
        assert!(parse_map_info(value).is_err());
    }

    #[test]
    fn test_parse_map_info_rejects_missing_fields() {
        let value = serde_json::json!({"width": 10});
        assert!(parse_map_info(value).is_err());
    }
}
