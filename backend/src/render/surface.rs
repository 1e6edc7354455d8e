//! Drawing surface abstraction.
//!
//! The render manager only talks to [`Surface`]. Backends decide what a
//! drawing call means: [`SvgSurface`](super::SvgSurface) writes markup,
//! [`DisplayList`](super::DisplayList) records calls.

use serde::Serialize;

use crate::geometry::{ScreenPoint, SurfaceSize};
use crate::quality::Color;

/// Drawing layers, in the order they are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Grid,
    HullFill,
    HullOutline,
    Centroids,
    Points,
    Overlay,
    Legend,
    Panels,
    Waiting,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Grid => "grid",
            Layer::HullFill => "hull-fill",
            Layer::HullOutline => "hull-outline",
            Layer::Centroids => "centroids",
            Layer::Points => "points",
            Layer::Overlay => "overlay",
            Layer::Legend => "legend",
            Layer::Panels => "panels",
            Layer::Waiting => "waiting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fill {
    pub color: Color,
    pub opacity: f64,
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Self { color, opacity: 1.0 }
    }

    pub fn translucent(color: Color, opacity: f64) -> Self {
        Self { color, opacity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    /// Dash and gap lengths; `None` for a solid line.
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f64, dash: f64, gap: f64) -> Self {
        Self {
            color,
            width,
            dash: Some((dash, gap)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: Color,
    pub size: f64,
    pub bold: bool,
    pub monospace: bool,
    pub anchor: TextAnchor,
}

impl TextStyle {
    pub fn new(color: Color, size: f64) -> Self {
        Self {
            color,
            size,
            bold: false,
            monospace: false,
            anchor: TextAnchor::Start,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn monospace(mut self) -> Self {
        self.monospace = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.anchor = TextAnchor::Middle;
        self
    }
}

/// A 2-D drawing target.
pub trait Surface {
    fn size(&self) -> SurfaceSize;

    /// Discard everything and paint the background.
    fn clear(&mut self, background: Color);

    /// Start a layer. Subsequent calls belong to it until the next layer.
    fn begin_layer(&mut self, layer: Layer);

    fn fill_polygon(&mut self, points: &[ScreenPoint], fill: Fill);

    fn stroke_polygon(&mut self, points: &[ScreenPoint], stroke: Stroke);

    fn polyline(&mut self, points: &[ScreenPoint], stroke: Stroke);

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, stroke: Stroke);

    fn circle(&mut self, center: ScreenPoint, radius: f64, fill: Option<Fill>, stroke: Option<Stroke>);

    fn rect(&mut self, origin: ScreenPoint, width: f64, height: f64, fill: Fill);

    fn text(&mut self, at: ScreenPoint, text: &str, style: TextStyle);
}
