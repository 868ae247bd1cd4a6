use thiserror::Error;

/// Failures surfaced by the viewer core.
///
/// `AssetLoadFailure` and `DatasetLoadFailure` abort initialisation; the
/// host shows them once and never wires up interaction. `LevelBuildFailure`
/// only ever reaches the resolution ladder, which falls back to drawing the
/// original raster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("failed to load map image: {0}")]
    AssetLoadFailure(String),
    #[error("failed to load node data: {0}")]
    DatasetLoadFailure(String),
    #[error("failed to build resolution level: {0}")]
    LevelBuildFailure(String),
}

impl MapError {
    /// Whether this error must stop the viewer from initialising.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MapError::AssetLoadFailure(_) | MapError::DatasetLoadFailure(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
