//! Pre-scaled copies of the map raster for low zoom levels.
//!
//! Drawing a large raster heavily downscaled every frame is slow and aliases
//! badly, so a ladder of downsampled surfaces is built near the minimum zoom.
//! Above the ladder's span the original raster is drawn directly.

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::MapAsset;

/// Scale slack when matching a level below the live scale.
const PICK_TOLERANCE: f64 = 1.02;

/// Guards the ladder loop against float drift at its upper bound.
const SPAN_EPSILON: f64 = 1e-6;

/// Produces downsampled copies of the map raster.
///
/// Implemented by the host over whatever surface type it draws with
/// (an off-screen canvas in the browser, an in-memory buffer in tests).
pub trait SurfaceFactory {
    type Surface;

    /// Render the full raster into a new `width x height` surface with
    /// high-quality smoothing.
    fn downsample(&mut self, width: u32, height: u32) -> Result<Self::Surface>;
}

/// One pre-scaled copy of the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionLevel<S> {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub surface: S,
}

/// Ladder scales: from `min_scale` up to `min_scale * span`, multiplying by `step`.
pub fn level_scales(min_scale: f64, span: f64, step: f64) -> Vec<f64> {
    let mut scales = Vec::new();
    if min_scale.is_nan() || min_scale <= 0.0 || step <= 1.0 {
        return scales;
    }
    let upper = min_scale * span + SPAN_EPSILON;
    let mut s = min_scale;
    while s <= upper {
        scales.push(s);
        s *= step;
    }
    scales
}

/// Pixel size of a level, never below 1x1.
pub fn level_size(map: MapAsset, scale: f64) -> (u32, u32) {
    let w = (map.width_f() * scale).round().max(1.0) as u32;
    let h = (map.height_f() * scale).round().max(1.0) as u32;
    (w, h)
}

/// Ordered set of resolution levels, ascending by scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionLadder<S> {
    levels: Vec<ResolutionLevel<S>>,
    span_limit: f64,
}

impl<S> Default for ResolutionLadder<S> {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            span_limit: 0.0,
        }
    }
}

impl<S> ResolutionLadder<S> {
    /// Build every level for the current minimum scale.
    ///
    /// If any level fails the whole ladder is discarded and the renderer
    /// falls back to the original raster.
    pub fn build<F>(
        factory: &mut F,
        map: MapAsset,
        min_scale: f64,
        span: f64,
        step: f64,
    ) -> Self
    where
        F: SurfaceFactory<Surface = S>,
    {
        let mut levels = Vec::new();
        for scale in level_scales(min_scale, span, step) {
            let (width, height) = level_size(map, scale);
            match factory.downsample(width, height) {
                Ok(surface) => levels.push(ResolutionLevel {
                    scale,
                    width,
                    height,
                    surface,
                }),
                Err(e) => {
                    warn!(error = %e, scale, "Resolution ladder disabled");
                    return Self::default();
                }
            }
        }
        debug!(count = levels.len(), min_scale, "Built resolution levels");
        Self {
            levels,
            span_limit: min_scale * span,
        }
    }

    pub fn levels(&self) -> &[ResolutionLevel<S>] {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level to draw at `scale`, or `None` to draw the original raster.
    ///
    /// Prefers the closest level at or slightly below the live scale so the
    /// drawn image is downscaled rather than stretched.
    pub fn pick(&self, scale: f64) -> Option<&ResolutionLevel<S>> {
        if self.levels.is_empty() || scale > self.span_limit {
            return None;
        }
        let below = closest(
            self.levels
                .iter()
                .filter(|l| l.scale <= scale * PICK_TOLERANCE),
            scale,
        );
        below.or_else(|| closest(self.levels.iter(), scale))
    }
}

fn closest<'a, S: 'a>(
    levels: impl Iterator<Item = &'a ResolutionLevel<S>>,
    scale: f64,
) -> Option<&'a ResolutionLevel<S>> {
    levels.min_by(|a, b| (a.scale - scale).abs().total_cmp(&(b.scale - scale).abs()))
}

/// The loaded raster plus its resolution ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRaster<S> {
    pub asset: MapAsset,
    pub original: S,
    pub ladder: ResolutionLadder<S>,
}

impl<S> MapRaster<S> {
    pub fn new(asset: MapAsset, original: S) -> Self {
        Self {
            asset,
            original,
            ladder: ResolutionLadder::default(),
        }
    }

    /// Replace the ladder for a new minimum scale.
    pub fn rebuild_levels<F>(&mut self, factory: &mut F, min_scale: f64, span: f64, step: f64)
    where
        F: SurfaceFactory<Surface = S>,
    {
        self.ladder = ResolutionLadder::build(factory, self.asset, min_scale, span, step);
    }
}
