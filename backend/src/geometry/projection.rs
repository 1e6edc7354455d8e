//! Linear lat/lon to surface projection.

use serde::{Deserialize, Serialize};

use super::{convex_hull, GeoBounds, LatLon};

/// Drawing surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A position on the drawing surface, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Bounds plus the affine transform that fits them into a padded surface.
///
/// Recomputed for every snapshot; never carried over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionContext {
    pub bounds: GeoBounds,
    pub size: SurfaceSize,
    pub padding: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Pixels per degree, or 1 when the span or drawable extent is zero.
fn scale(extent: f64, span: f64) -> f64 {
    let s = extent / span;
    if s.is_finite() && s != 0.0 {
        s
    } else {
        1.0
    }
}

impl ProjectionContext {
    pub fn new(bounds: GeoBounds, size: SurfaceSize, padding: f64) -> Self {
        let scale_x = scale(size.width - 2.0 * padding, bounds.lon_span());
        let scale_y = scale(size.height - 2.0 * padding, bounds.lat_span());
        Self {
            bounds,
            size,
            padding,
            scale_x,
            scale_y,
        }
    }

    /// Longitude grows with x; latitude grows upward.
    pub fn project(&self, point: &impl LatLon) -> ScreenPoint {
        ScreenPoint {
            x: self.padding + (point.lon() - self.bounds.min_lon) * self.scale_x,
            y: self.size.height - self.padding - (point.lat() - self.bounds.min_lat) * self.scale_y,
        }
    }

    /// Inverse of [`project`](Self::project), returning `(lat, lon)`.
    pub fn unproject(&self, screen: ScreenPoint) -> (f64, f64) {
        let lon = self.bounds.min_lon + (screen.x - self.padding) / self.scale_x;
        let lat = self.bounds.min_lat + (self.size.height - self.padding - screen.y) / self.scale_y;
        (lat, lon)
    }
}

/// One-off projection of a single point.
pub fn project(point: &impl LatLon, bounds: GeoBounds, size: SurfaceSize, padding: f64) -> ScreenPoint {
    ProjectionContext::new(bounds, size, padding).project(point)
}

/// Convex hull of `points` in surface coordinates, or `None` when the points
/// do not form a polygon.
pub fn projected_hull<P: LatLon + Clone>(points: &[P], ctx: &ProjectionContext) -> Option<Vec<ScreenPoint>> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }
    Some(hull.iter().map(|p| ctx.project(p)).collect())
}
