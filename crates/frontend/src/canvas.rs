//! Browser side of the renderer: a 2D context as a [`RenderTarget`], and
//! off-screen canvases as resolution levels.

use factory_map_shared::cache::SurfaceFactory;
use factory_map_shared::render::{RenderTarget, Rgba};
use factory_map_shared::MapError;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement,
    ImageSmoothingQuality,
};

/// Anything the map can be drawn from.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasImage {
    Image(HtmlImageElement),
    Canvas(HtmlCanvasElement),
}

/// Fetch and decode the raster. Resolves once the image can be drawn.
pub async fn load_image(url: &str) -> Result<HtmlImageElement, MapError> {
    let image = HtmlImageElement::new()
        .map_err(|_| MapError::AssetLoadFailure("cannot create image element".into()))?;
    image.set_src(url);
    JsFuture::from(image.decode())
        .await
        .map_err(|_| MapError::AssetLoadFailure(format!("could not decode {url}")))?;
    if image.natural_width() == 0 || image.natural_height() == 0 {
        return Err(MapError::AssetLoadFailure(format!("{url} has no pixels")));
    }
    Ok(image)
}

/// The 2D context of a canvas element.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

/// Draws through a borrowed 2D context.
///
/// Canvas calls only fail on non-finite arguments; those frames are
/// dropped silently, like the browser does for NaN paths.
pub struct CanvasTarget<'a> {
    ctx: &'a CanvasRenderingContext2d,
}

impl<'a> CanvasTarget<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl RenderTarget for CanvasTarget<'_> {
    type Image = CanvasImage;

    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f64, y: f64) {
        let _ = self.ctx.translate(x, y);
    }

    fn scale(&mut self, factor: f64) {
        let _ = self.ctx.scale(factor, factor);
    }

    fn draw_image(&mut self, image: &CanvasImage, x: f64, y: f64) {
        let _ = match image {
            CanvasImage::Image(img) => self.ctx.draw_image_with_html_image_element(img, x, y),
            CanvasImage::Canvas(canvas) => self.ctx.draw_image_with_html_canvas_element(canvas, x, y),
        };
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64) {
        let _ = self.ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU);
    }

    fn set_fill(&mut self, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_string());
    }

    fn set_stroke(&mut self, color: Rgba) {
        self.ctx.set_stroke_style_str(&color.to_string());
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }
}

/// Builds resolution levels by redrawing the source image into detached
/// canvases with high-quality smoothing.
pub struct LevelCanvasFactory {
    document: Document,
    source: HtmlImageElement,
}

impl LevelCanvasFactory {
    pub fn new(document: Document, source: HtmlImageElement) -> Self {
        Self { document, source }
    }
}

impl SurfaceFactory for LevelCanvasFactory {
    type Surface = CanvasImage;

    fn downsample(&mut self, width: u32, height: u32) -> factory_map_shared::Result<CanvasImage> {
        let canvas = self
            .document
            .create_element("canvas")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| MapError::LevelBuildFailure("off-screen canvas unsupported".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);

        let ctx = context_2d(&canvas)
            .ok_or_else(|| MapError::LevelBuildFailure("no 2d context".into()))?;
        ctx.set_image_smoothing_enabled(true);
        ctx.set_image_smoothing_quality(ImageSmoothingQuality::High);
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &self.source,
            0.0,
            0.0,
            width as f64,
            height as f64,
        )
        .map_err(|_| MapError::LevelBuildFailure(format!("draw into {width}x{height} failed")))?;

        Ok(CanvasImage::Canvas(canvas))
    }
}
