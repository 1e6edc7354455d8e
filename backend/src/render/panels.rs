//! Auxiliary KPI panels: elbow chart and silhouette scores.

use super::surface::{Fill, Stroke, Surface, TextStyle};
use crate::geometry::ScreenPoint;
use crate::models::{ElbowResult, KpiPanels, SilhouetteResult};
use crate::quality::Color;

const PANEL_WIDTH: f64 = 200.0;
const PANEL_HEIGHT: f64 = 120.0;
const MARGIN: f64 = 10.0;
const MAX_SCORE_ROWS: usize = 5;

const HIGHLIGHT: Color = Color::rgb(0x33, 0xff, 0x57);
const LINE: Color = Color::rgb(0x31, 0x86, 0xcc);

fn panel_background(surface: &mut dyn Surface, origin: ScreenPoint) {
    surface.rect(origin, PANEL_WIDTH, PANEL_HEIGHT, Fill::translucent(Color::BLACK, 0.8));
}

/// Draw whichever panels have data. Elbow bottom-left, silhouette bottom-right.
pub fn draw_kpi_panels(surface: &mut dyn Surface, panels: &KpiPanels) {
    let size = surface.size();
    let top = size.height - PANEL_HEIGHT - MARGIN;
    if let Some(elbow) = panels.elbow.as_ref() {
        draw_elbow(surface, elbow, ScreenPoint::new(MARGIN, top));
    }
    if let Some(silhouette) = panels.silhouette.as_ref() {
        let left = size.width - PANEL_WIDTH - MARGIN;
        draw_silhouette(surface, silhouette, ScreenPoint::new(left, top));
    }
}

fn draw_elbow(surface: &mut dyn Surface, elbow: &ElbowResult, origin: ScreenPoint) {
    panel_background(surface, origin);
    let label = TextStyle::new(Color::WHITE, 11.0).monospace();
    let title = match elbow.recommended_k() {
        Some(k) => format!("Elbow: optimal k={}", k),
        None => "Elbow: no recommendation".to_string(),
    };
    surface.text(ScreenPoint::new(origin.x + 10.0, origin.y + 18.0), &title, label);

    if elbow.sse_values.len() < 2 {
        return;
    }

    // Plot area inside the panel, below the title.
    let (x0, y0) = (origin.x + 15.0, origin.y + 30.0);
    let (w, h) = (PANEL_WIDTH - 30.0, PANEL_HEIGHT - 45.0);

    let (k_min, k_max) = match (elbow.sse_values.keys().next(), elbow.sse_values.keys().next_back()) {
        (Some(a), Some(b)) => (f64::from(*a), f64::from(*b)),
        _ => return,
    };
    let (v_min, v_max) = elbow
        .sse_values
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let k_span = if k_max > k_min { k_max - k_min } else { 1.0 };
    let v_span = if v_max > v_min { v_max - v_min } else { 1.0 };

    let to_screen = |k: u32, v: f64| {
        ScreenPoint::new(
            x0 + (f64::from(k) - k_min) / k_span * w,
            y0 + h - (v - v_min) / v_span * h,
        )
    };

    let line: Vec<ScreenPoint> = elbow.sse_values.iter().map(|(k, v)| to_screen(*k, *v)).collect();
    surface.polyline(&line, Stroke::solid(LINE, 1.5));

    if let Some(k) = elbow.recommended_k() {
        if let Some(v) = elbow.sse_values.get(&k) {
            surface.circle(to_screen(k, *v), 4.0, Some(Fill::solid(HIGHLIGHT)), None);
        }
    }
}

fn draw_silhouette(surface: &mut dyn Surface, silhouette: &SilhouetteResult, origin: ScreenPoint) {
    panel_background(surface, origin);
    let label = TextStyle::new(Color::WHITE, 11.0).monospace();
    surface.text(
        ScreenPoint::new(origin.x + 10.0, origin.y + 18.0),
        &format!("Silhouette: {:.3}", silhouette.overall_score),
        label,
    );

    for (row, (cluster, score)) in silhouette
        .per_cluster_scores
        .iter()
        .take(MAX_SCORE_ROWS)
        .enumerate()
    {
        let y = origin.y + 38.0 + row as f64 * 16.0;
        surface.text(
            ScreenPoint::new(origin.x + 10.0, y),
            &format!("Zone {}: {:.3}", cluster, score),
            label,
        );
    }
}
