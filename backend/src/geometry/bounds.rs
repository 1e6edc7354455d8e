//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

use super::{GeometryError, LatLon};

/// Axis-aligned bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// True when every point shares one position.
    pub fn is_degenerate(&self) -> bool {
        self.lat_span() == 0.0 || self.lon_span() == 0.0
    }

    pub fn contains(&self, point: &impl LatLon) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat())
            && (self.min_lon..=self.max_lon).contains(&point.lon())
    }
}

/// Compute the bounding box of a point set.
///
/// # Errors
/// Returns [`GeometryError::EmptyInput`] when `points` yields nothing.
pub fn compute_bounds<P, I>(points: I) -> Result<GeoBounds, GeometryError>
where
    P: LatLon,
    I: IntoIterator<Item = P>,
{
    let mut iter = points.into_iter();
    let first = iter.next().ok_or(GeometryError::EmptyInput)?;
    let mut bounds = GeoBounds {
        min_lat: first.lat(),
        max_lat: first.lat(),
        min_lon: first.lon(),
        max_lon: first.lon(),
    };

    for p in iter {
        bounds.min_lat = bounds.min_lat.min(p.lat());
        bounds.max_lat = bounds.max_lat.max(p.lat());
        bounds.min_lon = bounds.min_lon.min(p.lon());
        bounds.max_lon = bounds.max_lon.max(p.lon());
    }

    Ok(bounds)
}
