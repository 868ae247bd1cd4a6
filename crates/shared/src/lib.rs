//! Interaction and rendering core for the factory map viewer.
//!
//! Pure Rust with no DOM types: the web front end feeds input into a
//! [`controller::MapController`] and draws through [`render::RenderTarget`].

pub mod cache;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod gesture;
pub mod models;
pub mod popup;
pub mod render;
pub mod scheduler;
pub mod search;
pub mod selection;
pub mod transform;

pub use config::ViewerConfig;
pub use controller::{Effects, FrameOutcome, MapController};
pub use error::{MapError, Result};
pub use models::{MapAsset, MapInfo, Node, ViewportState};
