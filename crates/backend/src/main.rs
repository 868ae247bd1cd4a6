mod assets;
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, Json, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use assets::Assets;
use config::ServerConfig;

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

#[derive(Clone)]
struct AppState {
    assets: Arc<Assets>,
    dist_dir: Arc<PathBuf>,
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

fn one_day_cache() -> [(axum::http::HeaderName, &'static str); 1] {
    [(axum::http::header::CACHE_CONTROL, CACHE_1DAY)]
}

async fn list_nodes(State(state): State<AppState>) -> Response {
    (one_day_cache(), Json(state.assets.nodes.clone())).into_response()
}

async fn get_node(State(state): State<AppState>, UrlPath(id): UrlPath<String>) -> Response {
    match state.assets.find_node(&id) {
        Some(node) => (one_day_cache(), Json(node.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, format!("No node with id {id}")).into_response(),
    }
}

async fn map_info(State(state): State<AppState>) -> Response {
    (one_day_cache(), Json(state.assets.map.clone())).into_response()
}

async fn serve_index(State(state): State<AppState>) -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match tokio::fs::read_to_string(state.dist_dir.join("index.html")).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Factory Map</title></head>
<body>
<h1>Factory Map</h1>
<p>Frontend not built yet. The node list is available at <a href="/api/nodes">/api/nodes</a>.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

/// Build the full application router.
fn build_app(assets: Arc<Assets>, config: &ServerConfig) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest(
            "/static",
            cached_static_router(&config.assets_dir, CACHE_1DAY),
        )
        .nest(
            "/dist",
            cached_static_router(&config.dist_dir, CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    let state = AppState {
        assets,
        dist_dir: Arc::new(config.dist_dir.clone()),
    };

    Router::new()
        .route("/api/nodes", get(list_nodes))
        .route("/api/nodes/{id}", get(get_node))
        .route("/api/map", get(map_info))
        .route("/", get(serve_index))
        .with_state(state)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let assets = match Assets::load(&config) {
        Ok(assets) => Arc::new(assets),
        Err(e) => {
            tracing::error!("Error initializing map: {}", e);
            std::process::exit(1);
        }
    };

    let app = build_app(assets, &config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, "Failed to bind: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Server running at http://localhost:{}", config.port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use factory_map_shared::models::{MapInfo, Node};
    use tower::ServiceExt;

    /// Build a test app that serves files from the given temp directories.
    fn test_app(assets_dir: &Path, dist_dir: &Path) -> Router {
        let assets = Assets {
            nodes: vec![
                Node::new("n1", "Dock 5", 10.0, 20.0).with_description("cs 5"),
                Node::new("n2", "Road", 30.0, 40.0),
            ],
            map: MapInfo {
                image_url: "/static/factory-map.png".to_string(),
                width: 1000,
                height: 800,
            },
        };
        let config = ServerConfig {
            assets_dir: assets_dir.to_path_buf(),
            dist_dir: dist_dir.to_path_buf(),
            ..ServerConfig::default()
        };
        build_app(Arc::new(assets), &config)
    }

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_nodes_endpoint_returns_dataset() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/api/nodes").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), CACHE_1DAY);

        let json = body_json(resp).await;
        let nodes = json.as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["name"], "Dock 5");
        assert_eq!(nodes[0]["description"], "cs 5");
        assert!(nodes[1].get("description").is_none());
    }

    #[tokio::test]
    async fn test_single_node_lookup() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app.clone(), "/api/nodes/n2").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "Road");

        let resp = get(app, "/api/nodes/missing").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_map_info_endpoint() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let json = body_json(get(app, "/api/map").await).await;
        assert_eq!(json["imageUrl"], "/static/factory-map.png");
        assert_eq!(json["width"], 1000);
        assert_eq!(json["height"], 800);
    }

    #[tokio::test]
    async fn test_index_served_from_dist() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html>viewer</html>");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>viewer</html>");
    }

    #[tokio::test]
    async fn test_index_fallback_without_build() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = tempfile::tempdir().unwrap();
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_static_assets_have_1day_cache() {
        let assets_dir = temp_dir_with_file("factory-map.png", "png-bytes");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/static/factory-map.png").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_dist_bundles_have_immutable_cache() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = temp_dir_with_file("app-abc123.js", "bundle()");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/dist/app-abc123.js").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_dist_assets_have_immutable_cache() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dist_dir.path().join("assets")).unwrap();
        std::fs::write(dist_dir.path().join("assets/style-xyz.css"), "body{}").unwrap();
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/assets/style-xyz.css").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let assets_dir = temp_dir_with_file("nodes.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = test_app(assets_dir.path(), dist_dir.path());

        let resp = get(app, "/static/nonexistent.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
