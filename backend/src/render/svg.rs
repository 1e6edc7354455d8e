//! SVG backend.

use std::fmt::Write as _;

use super::surface::{Fill, Layer, Stroke, Surface, TextAnchor, TextStyle};
use crate::geometry::{ScreenPoint, SurfaceSize};
use crate::quality::Color;

/// Renders drawing calls to an SVG document, one `<g>` per layer.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    size: SurfaceSize,
    body: String,
    layer_open: bool,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn points_attr(points: &[ScreenPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fill_attrs(fill: Option<Fill>) -> String {
    match fill {
        Some(f) if f.opacity < 1.0 => format!(r#"fill="{}" fill-opacity="{:.3}""#, f.color, f.opacity),
        Some(f) => format!(r#"fill="{}""#, f.color),
        None => r#"fill="none""#.to_string(),
    }
}

fn stroke_attrs(stroke: Option<Stroke>) -> String {
    match stroke {
        Some(s) => {
            let mut attrs = format!(r#"stroke="{}" stroke-width="{}""#, s.color, s.width);
            if let Some((dash, gap)) = s.dash {
                let _ = write!(attrs, r#" stroke-dasharray="{} {}""#, dash, gap);
            }
            attrs
        }
        None => String::new(),
    }
}

impl SvgSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            body: String::new(),
            layer_open: false,
        }
    }

    /// The complete document.
    pub fn finish(mut self) -> String {
        self.close_layer();
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
            w = self.size.width,
            h = self.size.height,
            body = self.body
        )
    }

    fn close_layer(&mut self) {
        if self.layer_open {
            self.body.push_str("</g>");
            self.layer_open = false;
        }
    }

    fn push(&mut self, element: String) {
        self.body.push_str(&element);
    }
}

impl Surface for SvgSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self, background: Color) {
        self.body.clear();
        self.layer_open = false;
        self.push(format!(
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
            self.size.width, self.size.height, background
        ));
    }

    fn begin_layer(&mut self, layer: Layer) {
        self.close_layer();
        self.push(format!(r#"<g id="layer-{}">"#, layer.as_str()));
        self.layer_open = true;
    }

    fn fill_polygon(&mut self, points: &[ScreenPoint], fill: Fill) {
        self.push(format!(
            r#"<polygon points="{}" {}/>"#,
            points_attr(points),
            fill_attrs(Some(fill))
        ));
    }

    fn stroke_polygon(&mut self, points: &[ScreenPoint], stroke: Stroke) {
        self.push(format!(
            r#"<polygon points="{}" fill="none" {}/>"#,
            points_attr(points),
            stroke_attrs(Some(stroke))
        ));
    }

    fn polyline(&mut self, points: &[ScreenPoint], stroke: Stroke) {
        self.push(format!(
            r#"<polyline points="{}" fill="none" {}/>"#,
            points_attr(points),
            stroke_attrs(Some(stroke))
        ));
    }

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, stroke: Stroke) {
        self.push(format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" {}/>"#,
            from.x,
            from.y,
            to.x,
            to.y,
            stroke_attrs(Some(stroke))
        ));
    }

    fn circle(&mut self, center: ScreenPoint, radius: f64, fill: Option<Fill>, stroke: Option<Stroke>) {
        let stroke = stroke_attrs(stroke);
        let sep = if stroke.is_empty() { "" } else { " " };
        self.push(format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{}" {}{}{}/>"#,
            center.x,
            center.y,
            radius,
            fill_attrs(fill),
            sep,
            stroke
        ));
    }

    fn rect(&mut self, origin: ScreenPoint, width: f64, height: f64, fill: Fill) {
        self.push(format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{}" height="{}" {}/>"#,
            origin.x,
            origin.y,
            width,
            height,
            fill_attrs(Some(fill))
        ));
    }

    fn text(&mut self, at: ScreenPoint, text: &str, style: TextStyle) {
        let anchor = match style.anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };
        let family = if style.monospace { "monospace" } else { "sans-serif" };
        let weight = if style.bold { r#" font-weight="bold""# } else { "" };
        self.push(format!(
            r#"<text x="{:.2}" y="{:.2}" fill="{}" font-size="{}" font-family="{}" text-anchor="{}"{}>{}</text>"#,
            at.x,
            at.y,
            style.color,
            style.size,
            family,
            anchor,
            weight,
            escape(text)
        ));
    }
}
