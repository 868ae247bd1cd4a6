//! Frame drawing against an abstract 2D target.
//!
//! Everything here is immediate-mode: a frame is a pure function of the
//! transform, nodes, selection and wall clock.

use std::f64::consts::TAU;
use std::fmt;

use crate::cache::MapRaster;
use crate::config::ViewerConfig;
use crate::models::Node;
use crate::selection::SelectionState;
use crate::transform::Transform;

/// An sRGB colour with alpha, printed as a CSS colour string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
        }
    }
}

pub const SELECTED_FILL: Rgba = Rgba::rgb(0xff, 0x6f, 0x00);
pub const BEACON_FILL: Rgba = Rgba::rgb(0x00, 0x96, 0xff);
pub const CHARGING_FILL: Rgba = Rgba::rgb(0xff, 0xeb, 0x3b);
pub const DESCRIBED_FILL: Rgba = Rgba::rgb(0xff, 0x17, 0x44);
pub const PLAIN_FILL: Rgba = Rgba::rgb(0x39, 0xff, 0x14);
pub const HALO_STROKE: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
pub const OUTLINE_STROKE: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 0.5,
};

/// Marker substring flagging a charging station in a description.
const CHARGING_KEYWORD: &str = "cs";

const PULSE_SPEED: f64 = 0.0025;
const PULSE_WAVES: usize = 2;
const PULSE_WAVE_OFFSET: f64 = 0.33;
const PULSE_GROWTH: f64 = 20.0;

/// The drawing primitives a frame needs. Implemented over the browser's
/// 2D context, and by a recording fake in tests.
pub trait RenderTarget {
    type Image;

    fn clear(&mut self, width: f64, height: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    /// Uniform scale.
    fn scale(&mut self, factor: f64);
    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64);
    fn begin_path(&mut self);
    /// Full circle.
    fn arc(&mut self, x: f64, y: f64, radius: f64);
    fn set_fill(&mut self, color: Rgba);
    fn set_stroke(&mut self, color: Rgba);
    fn set_line_width(&mut self, width: f64);
    fn fill(&mut self);
    fn stroke(&mut self);
}

/// How one marker is painted. Line widths are in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub line_width_px: f64,
}

/// Colour precedence: selected, then beaconed/highlighted, then by description.
pub fn marker_style(node: &Node, selected: bool, beaconed: bool, config: &ViewerConfig) -> MarkerStyle {
    if selected {
        return MarkerStyle {
            radius: config.highlighted_radius,
            fill: SELECTED_FILL,
            stroke: HALO_STROKE,
            line_width_px: 3.0,
        };
    }
    if beaconed {
        return MarkerStyle {
            radius: config.highlighted_radius,
            fill: BEACON_FILL,
            stroke: HALO_STROKE,
            line_width_px: 2.0,
        };
    }
    let description = node.description_text().to_lowercase();
    let fill = if description.contains(CHARGING_KEYWORD) {
        CHARGING_FILL
    } else if node.has_description() {
        DESCRIBED_FILL
    } else {
        PLAIN_FILL
    };
    MarkerStyle {
        radius: config.node_radius,
        fill,
        stroke: OUTLINE_STROKE,
        line_width_px: 1.0,
    }
}

/// Markers drawn per frame at `scale`. Fewer when zoomed in, where each one
/// covers more pixels.
pub fn node_cap(scale: f64) -> usize {
    if scale > 2.0 {
        250
    } else if scale > 1.5 {
        550
    } else if scale > 1.0 {
        750
    } else {
        960
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseRing {
    pub radius: f64,
    pub color: Rgba,
    pub line_width_px: f64,
}

/// Expanding rings around a selected (orange) or beaconed (blue) marker.
pub fn pulse_rings(now_ms: f64, selected: bool, config: &ViewerConfig) -> [PulseRing; PULSE_WAVES] {
    let t = now_ms * PULSE_SPEED;
    let base = if selected {
        config.highlighted_radius
    } else {
        config.node_radius
    };
    let (color, line_width_px) = if selected {
        (SELECTED_FILL, 3.0)
    } else {
        (BEACON_FILL, 2.5)
    };
    std::array::from_fn(|i| {
        let phase = (t + i as f64 * PULSE_WAVE_OFFSET).rem_euclid(1.0);
        PulseRing {
            radius: base + PULSE_GROWTH * phase,
            color: color.with_alpha(0.5 * (1.0 - phase)),
            line_width_px,
        }
    })
}

/// Everything a frame reads.
pub struct Frame<'a> {
    pub transform: &'a Transform,
    pub nodes: &'a [Node],
    pub selection: &'a SelectionState,
    pub now_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub drawn: usize,
    /// Visible nodes skipped by the per-frame cap.
    pub capped: usize,
    /// Scale of the resolution level used, `None` for the original raster.
    pub level_scale: Option<f64>,
}

/// Draw one frame. Without a raster only the clear happens.
pub fn render_frame<T: RenderTarget>(
    target: &mut T,
    raster: Option<&MapRaster<T::Image>>,
    frame: &Frame<'_>,
    config: &ViewerConfig,
) -> FrameStats {
    let transform = frame.transform;
    let (vw, vh) = transform.viewport_size();
    target.clear(vw, vh);

    let Some(raster) = raster else {
        return FrameStats::default();
    };

    let scale = transform.scale();
    let (ox, oy) = transform.offset();
    let mut stats = FrameStats::default();

    target.save();
    target.translate(ox, oy);
    target.scale(scale);

    match raster.ladder.pick(scale) {
        Some(level) => {
            target.scale(1.0 / level.scale);
            target.draw_image(&level.surface, 0.0, 0.0);
            target.scale(level.scale);
            stats.level_scale = Some(level.scale);
        }
        None => target.draw_image(&raster.original, 0.0, 0.0),
    }

    let visible = transform
        .visible_surface_rect()
        .expanded(config.max_marker_radius() * 2.0);
    let cap = node_cap(scale);
    let map = transform.map();

    for (index, node) in frame.nodes.iter().enumerate() {
        let (x, y) = map.surface_position(node);
        if !visible.contains(x, y) {
            continue;
        }
        if stats.drawn >= cap {
            stats.capped += 1;
            continue;
        }
        stats.drawn += 1;

        let selected = frame.selection.selected() == Some(index);
        let beaconed = frame.selection.is_beaconed(&node.id);
        let highlighted = frame.selection.highlighted() == Some(index);
        let style = marker_style(node, selected, beaconed || highlighted, config);

        target.begin_path();
        target.arc(x, y, style.radius);
        target.set_fill(style.fill);
        target.set_stroke(style.stroke);
        target.set_line_width(style.line_width_px / scale);
        target.fill();
        target.stroke();

        if selected || beaconed {
            for ring in pulse_rings(frame.now_ms, selected, config) {
                target.begin_path();
                target.arc(x, y, ring.radius);
                target.set_stroke(ring.color);
                target.set_line_width(ring.line_width_px / scale);
                target.stroke();
            }
        }
    }

    target.restore();
    stats
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear,
        Save,
        Restore,
        Translate(f64, f64),
        Scale(f64),
        DrawImage(&'static str),
        Arc(f64, f64, f64),
        Fill(String),
        Stroke(String),
        LineWidth(f64),
    }

    /// Records calls; images are labels.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub ops: Vec<Op>,
        fill: String,
        stroke: String,
    }

    impl Recorder {
        pub fn arcs(&self) -> Vec<(f64, f64, f64)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Arc(x, y, r) => Some((*x, *y, *r)),
                    _ => None,
                })
                .collect()
        }

        pub fn fills(&self) -> Vec<String> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Fill(c) => Some(c.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl RenderTarget for Recorder {
        type Image = &'static str;

        fn clear(&mut self, _width: f64, _height: f64) {
            self.ops.push(Op::Clear);
        }
        fn save(&mut self) {
            self.ops.push(Op::Save);
        }
        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
        fn translate(&mut self, x: f64, y: f64) {
            self.ops.push(Op::Translate(x, y));
        }
        fn scale(&mut self, factor: f64) {
            self.ops.push(Op::Scale(factor));
        }
        fn draw_image(&mut self, image: &Self::Image, _x: f64, _y: f64) {
            self.ops.push(Op::DrawImage(*image));
        }
        fn begin_path(&mut self) {}
        fn arc(&mut self, x: f64, y: f64, radius: f64) {
            self.ops.push(Op::Arc(x, y, radius));
        }
        fn set_fill(&mut self, color: Rgba) {
            self.fill = color.to_string();
        }
        fn set_stroke(&mut self, color: Rgba) {
            self.stroke = color.to_string();
        }
        fn set_line_width(&mut self, width: f64) {
            self.ops.push(Op::LineWidth(width));
        }
        fn fill(&mut self) {
            self.ops.push(Op::Fill(self.fill.clone()));
        }
        fn stroke(&mut self) {
            self.ops.push(Op::Stroke(self.stroke.clone()));
        }
    }
}
