//! Render surface manager.
//!
//! Every frame is a full redraw: clear, then paint the layers in [`Layer`]
//! order. Bounds are recomputed from the snapshot each time, so nothing
//! drawn for an earlier snapshot can survive into the next one.

use serde::Serialize;

use super::panels::draw_kpi_panels;
use super::style::RenderStyle;
use super::surface::{Fill, Layer, Stroke, Surface, TextAnchor, TextStyle};
use crate::geometry::{compute_bounds, projected_hull, LatLon, ProjectionContext, ScreenPoint};
use crate::models::{ClusterId, ClusterUpdate, ClusterZone, GeoPoint, KpiPanels};
use crate::quality::{Color, QualityConfig};

const CONNECTED: Color = Color::rgb(0x33, 0xff, 0x57);
const DISCONNECTED: Color = Color::rgb(0xff, 0x00, 0x00);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// No usable snapshot yet; a waiting indicator is shown.
    Empty,
    /// The surface reflects the latest accepted snapshot.
    Rendered,
}

/// Inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub update: Option<&'a ClusterUpdate>,
    /// Connectivity indicator in the overlay.
    pub connected: bool,
    pub quality: &'a QualityConfig,
    pub scheme: &'a str,
    pub panels: Option<&'a KpiPanels>,
}

/// What a frame ended up drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub state: RenderState,
    pub zones_drawn: Vec<ClusterId>,
    pub hulls_drawn: usize,
    pub points_drawn: usize,
}

impl RenderReport {
    pub fn empty() -> Self {
        Self {
            state: RenderState::Empty,
            zones_drawn: Vec::new(),
            hulls_drawn: 0,
            points_drawn: 0,
        }
    }
}

/// A zone that passed the filters, with its color and members.
struct VisibleZone<'a> {
    zone: &'a ClusterZone,
    color: Color,
    members: Vec<&'a GeoPoint>,
}

pub struct RenderSurfaceManager {
    style: RenderStyle,
    state: RenderState,
    projection: Option<ProjectionContext>,
    frames: u64,
}

impl RenderSurfaceManager {
    pub fn new(style: RenderStyle) -> Self {
        Self {
            style,
            state: RenderState::Empty,
            projection: None,
            frames: 0,
        }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: RenderStyle) {
        self.style = style;
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Projection used by the last rendered frame.
    pub fn projection(&self) -> Option<&ProjectionContext> {
        self.projection.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Redraw `surface` from scratch for `frame`.
    pub fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) -> RenderReport {
        self.frames += 1;
        surface.clear(self.style.background);

        let update = match frame.update {
            Some(u) if !u.is_empty() => u,
            other => {
                draw_waiting(surface, other.map_or(0, |u| u.total_points));
                self.state = RenderState::Empty;
                self.projection = None;
                return RenderReport::empty();
            }
        };

        if !update.is_consistent() {
            log::warn!(
                "Rendering inconsistent snapshot {}: zones sum to {}, total {}",
                update.update_id,
                update.zone_point_sum(),
                update.total_points
            );
        }

        let zones = self.visible_zones(update, frame);
        let ctx = projection_for(&zones, surface, self.style.padding);

        if self.style.show_grid {
            surface.begin_layer(Layer::Grid);
            draw_grid(surface, &self.style);
        }

        let mut report = RenderReport {
            state: RenderState::Rendered,
            zones_drawn: zones.iter().map(|z| z.zone.id).collect(),
            hulls_drawn: 0,
            points_drawn: 0,
        };

        if let Some(ctx) = ctx.as_ref() {
            let hulls: Vec<(Color, Vec<ScreenPoint>)> = zones
                .iter()
                .filter_map(|z| projected_hull(&z.members, ctx).map(|h| (z.color, h)))
                .collect();
            report.hulls_drawn = hulls.len();

            surface.begin_layer(Layer::HullFill);
            for (color, hull) in &hulls {
                surface.fill_polygon(hull, Fill::translucent(*color, self.style.hull_fill_opacity()));
            }
            surface.begin_layer(Layer::HullOutline);
            for (color, hull) in &hulls {
                surface.stroke_polygon(hull, Stroke::solid(*color, self.style.hull_stroke_width));
            }

            surface.begin_layer(Layer::Centroids);
            for z in &zones {
                draw_centroid(surface, z, ctx, &self.style);
            }

            if self.style.show_points {
                surface.begin_layer(Layer::Points);
                for z in &zones {
                    for p in &z.members {
                        surface.circle(
                            ctx.project(*p),
                            self.style.point_radius,
                            Some(Fill::translucent(z.color, self.style.point_opacity)),
                            None,
                        );
                        report.points_drawn += 1;
                    }
                }
            }
        }

        if self.style.show_overlay {
            surface.begin_layer(Layer::Overlay);
            draw_overlay(surface, update, zones.len(), frame.connected);
        }
        if self.style.show_legend {
            surface.begin_layer(Layer::Legend);
            draw_legend(surface, &zones);
        }
        if let Some(panels) = frame.panels.filter(|p| self.style.show_kpi_panels && !p.is_empty()) {
            surface.begin_layer(Layer::Panels);
            draw_kpi_panels(surface, panels);
        }

        self.state = RenderState::Rendered;
        self.projection = ctx;
        report
    }

    fn visible_zones<'a>(&self, update: &'a ClusterUpdate, frame: &Frame<'_>) -> Vec<VisibleZone<'a>> {
        update
            .non_empty_zones()
            .filter(|z| self.style.shows_tier(&z.quality))
            .map(|zone| VisibleZone {
                zone,
                color: frame.quality.color_for(&zone.quality, frame.scheme),
                members: update.points_of(zone.id).collect(),
            })
            .collect()
    }
}

/// Bounds over the drawn points and centroids.
fn projection_for(zones: &[VisibleZone<'_>], surface: &dyn Surface, padding: f64) -> Option<ProjectionContext> {
    let positions = zones.iter().flat_map(|z| {
        std::iter::once((z.zone.lat(), z.zone.lon())).chain(z.members.iter().map(|p| (p.lat(), p.lon())))
    });
    compute_bounds(positions)
        .ok()
        .map(|bounds| ProjectionContext::new(bounds, surface.size(), padding))
}

fn draw_waiting(surface: &mut dyn Surface, points: usize) {
    let size = surface.size();
    surface.begin_layer(Layer::Waiting);
    surface.text(
        ScreenPoint::new(size.width / 2.0, size.height / 2.0),
        &format!("Collecting GPS data... ({} points)", points),
        TextStyle::new(Color::rgb(0x9c, 0xa3, 0xaf), 14.0).centered(),
    );
}

fn draw_grid(surface: &mut dyn Surface, style: &RenderStyle) {
    let size = surface.size();
    let divisions = style.grid_divisions.max(1);
    let (left, right) = (style.padding, size.width - style.padding);
    let (top, bottom) = (style.padding, size.height - style.padding);
    let stroke = Stroke::dashed(style.grid_color, 1.0, 2.0, 2.0);

    for i in 0..=divisions {
        let t = f64::from(i) / f64::from(divisions);
        let x = left + t * (right - left);
        surface.line(ScreenPoint::new(x, top), ScreenPoint::new(x, bottom), stroke);
    }
    for i in 0..=divisions {
        let t = f64::from(i) / f64::from(divisions);
        let y = top + t * (bottom - top);
        surface.line(ScreenPoint::new(left, y), ScreenPoint::new(right, y), stroke);
    }
}

fn draw_centroid(surface: &mut dyn Surface, z: &VisibleZone<'_>, ctx: &ProjectionContext, style: &RenderStyle) {
    let c = ctx.project(z.zone);
    surface.circle(
        c,
        style.centroid_radius,
        Some(Fill::solid(z.color)),
        Some(Stroke::solid(Color::WHITE, 2.0)),
    );
    surface.text(
        ScreenPoint::new(c.x, c.y - 15.0),
        &format!("Zone {}", z.zone.id),
        TextStyle::new(Color::WHITE, 12.0).bold().centered(),
    );
    surface.text(
        ScreenPoint::new(c.x, c.y + 20.0),
        z.zone.quality.as_str(),
        TextStyle::new(Color::WHITE, 10.0).centered(),
    );
}

fn draw_overlay(surface: &mut dyn Surface, update: &ClusterUpdate, zones: usize, connected: bool) {
    surface.rect(ScreenPoint::new(10.0, 10.0), 200.0, 80.0, Fill::translucent(Color::BLACK, 0.8));
    let label = TextStyle::new(Color::WHITE, 11.0).monospace();
    let source: String = update.source_id.chars().take(8).collect();
    let source = if source.is_empty() { "N/A".to_string() } else { source };

    surface.text(ScreenPoint::new(20.0, 30.0), &format!("Points: {}", update.total_points), label);
    surface.text(ScreenPoint::new(20.0, 50.0), &format!("Zones: {}", zones), label);
    surface.text(ScreenPoint::new(20.0, 70.0), &format!("Source: {}", source), label);

    let (dot, status) = if connected {
        (CONNECTED, "Live")
    } else {
        (DISCONNECTED, "Disconnected")
    };
    surface.circle(ScreenPoint::new(196.0, 26.0), 5.0, Some(Fill::solid(dot)), None);
    let status_style = TextStyle {
        anchor: TextAnchor::End,
        ..TextStyle::new(Color::WHITE, 10.0)
    };
    surface.text(ScreenPoint::new(186.0, 30.0), status, status_style);
}

fn draw_legend(surface: &mut dyn Surface, zones: &[VisibleZone<'_>]) {
    let x = surface.size().width - 210.0;
    for (row, z) in zones.iter().enumerate() {
        let y = 20.0 + row as f64 * 18.0;
        surface.rect(ScreenPoint::new(x, y - 9.0), 10.0, 10.0, Fill::solid(z.color));
        surface.text(
            ScreenPoint::new(x + 16.0, y),
            &format!("Zone {}: {} ({})", z.zone.id, z.zone.quality, z.zone.point_count),
            TextStyle::new(Color::WHITE, 11.0),
        );
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
