//! Render style: sizes, toggles and the tier filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::SurfaceSize;
use crate::quality::{Color, QualityTier};

/// Everything that varies between map presentations.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub size: SurfaceSize,
    pub padding: f64,
    pub background: Color,
    pub grid_color: Color,
    pub grid_divisions: u32,
    pub centroid_radius: f64,
    pub point_radius: f64,
    pub point_opacity: f64,
    /// Hull fill alpha, 0..=255, applied to the zone color.
    pub hull_fill_alpha: u8,
    pub hull_stroke_width: f64,
    /// Pointer distance within which a centroid counts as hit.
    pub hit_radius: f64,
    pub show_grid: bool,
    pub show_points: bool,
    pub show_overlay: bool,
    pub show_legend: bool,
    pub show_kpi_panels: bool,
    /// Tiers to draw; `None` draws every tier.
    pub tier_filter: Option<HashSet<QualityTier>>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            size: SurfaceSize::new(800.0, 600.0),
            padding: 40.0,
            background: Color::rgb(0x11, 0x18, 0x27),
            grid_color: Color::rgb(0x33, 0x33, 0x33),
            grid_divisions: 10,
            centroid_radius: 8.0,
            point_radius: 3.0,
            point_opacity: 0.7,
            hull_fill_alpha: 0x20,
            hull_stroke_width: 2.0,
            hit_radius: 12.0,
            show_grid: true,
            show_points: true,
            show_overlay: true,
            show_legend: true,
            show_kpi_panels: true,
            tier_filter: None,
        }
    }
}

impl RenderStyle {
    /// Whether zones of `tier` are drawn (and therefore clickable).
    pub fn shows_tier(&self, tier: &QualityTier) -> bool {
        self.tier_filter.as_ref().map_or(true, |f| f.contains(tier))
    }

    pub fn hull_fill_opacity(&self) -> f64 {
        f64::from(self.hull_fill_alpha) / 255.0
    }

    /// Restrict drawing to the given tiers; an empty list clears the filter.
    pub fn with_tier_filter(mut self, tiers: impl IntoIterator<Item = QualityTier>) -> Self {
        let set: HashSet<QualityTier> = tiers.into_iter().collect();
        self.tier_filter = if set.is_empty() { None } else { Some(set) };
        self
    }
}

/// Serializable tier filter used by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFilter {
    #[serde(default)]
    pub tiers: Vec<QualityTier>,
}
