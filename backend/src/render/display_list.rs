//! Recorded drawing commands.

use serde::Serialize;

use super::surface::{Fill, Layer, Stroke, Surface, TextStyle};
use crate::geometry::{ScreenPoint, SurfaceSize};
use crate::quality::Color;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { background: Color },
    BeginLayer { layer: Layer },
    FillPolygon { points: Vec<ScreenPoint>, fill: Fill },
    StrokePolygon { points: Vec<ScreenPoint>, stroke: Stroke },
    Polyline { points: Vec<ScreenPoint>, stroke: Stroke },
    Line { from: ScreenPoint, to: ScreenPoint, stroke: Stroke },
    Circle {
        center: ScreenPoint,
        radius: f64,
        fill: Option<Fill>,
        stroke: Option<Stroke>,
    },
    Rect {
        origin: ScreenPoint,
        width: f64,
        height: f64,
        fill: Fill,
    },
    Text { at: ScreenPoint, text: String, style: TextStyle },
}

/// A surface that remembers what was drawn.
///
/// Useful for inspecting a frame and for drawing once, replaying many times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayList {
    size: SurfaceSize,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Layers in the order they were begun.
    pub fn layers(&self) -> Vec<Layer> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginLayer { layer } => Some(*layer),
                _ => None,
            })
            .collect()
    }

    /// Commands drawn inside `layer`.
    pub fn in_layer(&self, layer: Layer) -> Vec<&DrawCommand> {
        let mut current = None;
        let mut out = Vec::new();
        for c in &self.commands {
            match c {
                DrawCommand::BeginLayer { layer: l } => current = Some(*l),
                DrawCommand::Clear { .. } => current = None,
                other if current == Some(layer) => out.push(other),
                _ => {}
            }
        }
        out
    }

    /// All text drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Draw every recorded command onto `target`.
    pub fn replay(&self, target: &mut dyn Surface) {
        for c in &self.commands {
            match c {
                DrawCommand::Clear { background } => target.clear(*background),
                DrawCommand::BeginLayer { layer } => target.begin_layer(*layer),
                DrawCommand::FillPolygon { points, fill } => target.fill_polygon(points, *fill),
                DrawCommand::StrokePolygon { points, stroke } => target.stroke_polygon(points, *stroke),
                DrawCommand::Polyline { points, stroke } => target.polyline(points, *stroke),
                DrawCommand::Line { from, to, stroke } => target.line(*from, *to, *stroke),
                DrawCommand::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => target.circle(*center, *radius, *fill, *stroke),
                DrawCommand::Rect {
                    origin,
                    width,
                    height,
                    fill,
                } => target.rect(*origin, *width, *height, *fill),
                DrawCommand::Text { at, text, style } => target.text(*at, text, *style),
            }
        }
    }
}

impl Surface for DisplayList {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self, background: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { background });
    }

    fn begin_layer(&mut self, layer: Layer) {
        self.commands.push(DrawCommand::BeginLayer { layer });
    }

    fn fill_polygon(&mut self, points: &[ScreenPoint], fill: Fill) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            fill,
        });
    }

    fn stroke_polygon(&mut self, points: &[ScreenPoint], stroke: Stroke) {
        self.commands.push(DrawCommand::StrokePolygon {
            points: points.to_vec(),
            stroke,
        });
    }

    fn polyline(&mut self, points: &[ScreenPoint], stroke: Stroke) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            stroke,
        });
    }

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { from, to, stroke });
    }

    fn circle(&mut self, center: ScreenPoint, radius: f64, fill: Option<Fill>, stroke: Option<Stroke>) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    fn rect(&mut self, origin: ScreenPoint, width: f64, height: f64, fill: Fill) {
        self.commands.push(DrawCommand::Rect {
            origin,
            width,
            height,
            fill,
        });
    }

    fn text(&mut self, at: ScreenPoint, text: &str, style: TextStyle) {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            style,
        });
    }
}
