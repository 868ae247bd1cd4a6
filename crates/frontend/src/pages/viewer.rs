use dioxus::logger::tracing::{error, info};
use dioxus::prelude::*;
use factory_map_shared::{MapError, MapInfo, Node};
use web_sys::HtmlImageElement;

use crate::api;
use crate::canvas::load_image;
use crate::components::map_view::MapView;

const LOAD_FAILED_MESSAGE: &str = "Failed to load map. Please refresh the page.";

/// The decoded map raster and what the server said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRaster {
    pub info: MapInfo,
    pub image: HtmlImageElement,
}

async fn load_raster() -> Result<LoadedRaster, MapError> {
    let info = api::fetch_map_info()
        .await
        .map_err(MapError::AssetLoadFailure)?;
    let image = load_image(&info.image_url).await?;
    info!(
        "Map loaded: {}x{}",
        image.natural_width(),
        image.natural_height()
    );
    Ok(LoadedRaster { info, image })
}

async fn load_nodes() -> Result<Vec<Node>, MapError> {
    api::fetch_nodes().await.map_err(MapError::DatasetLoadFailure)
}

fn report<T>(result: Result<T, MapError>) -> Result<T, MapError> {
    if let Err(e) = &result {
        error!("Failed to initialize map: {e}");
    }
    result
}

#[component]
pub fn Viewer() -> Element {
    // Both loads run concurrently; either failing is fatal.
    let raster = use_resource(|| async { report(load_raster().await) });
    let nodes = use_resource(|| async { report(load_nodes().await) });

    let raster = raster.read();
    let nodes = nodes.read();

    match (&*raster, &*nodes) {
        (Some(Err(_)), _) | (_, Some(Err(_))) => rsx! {
            div { class: "loading-overlay error",
                div { class: "error-icon", "⚠" }
                p { class: "error-title", "Error" }
                p { class: "error-message", "{LOAD_FAILED_MESSAGE}" }
            }
        },
        (Some(Ok(raster)), Some(Ok(nodes))) => rsx! {
            MapView { raster: raster.clone(), nodes: nodes.clone() }
        },
        _ => rsx! {
            div { class: "loading-overlay",
                div { class: "spinner" }
                p { "Loading factory map..." }
            }
        },
    }
}
