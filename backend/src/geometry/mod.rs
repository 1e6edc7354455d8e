//! Geometry kernel.
//!
//! Pure functions over geographic points: convex hulls, bounding boxes,
//! the linear lat/lon to surface projection and point-in-polygon tests.
//! Nothing here performs I/O or keeps state between calls.
//!
//! Coordinates are decimal degrees. Surface coordinates grow right (x) and
//! down (y), so projection inverts latitude to keep north up.

pub mod bounds;
pub mod hull;
pub mod polygon;
pub mod projection;

pub use bounds::{compute_bounds, GeoBounds};
pub use hull::convex_hull;
pub use polygon::point_in_polygon;
pub use projection::{project, projected_hull, ProjectionContext, ScreenPoint, SurfaceSize};

/// Anything with a geographic position.
pub trait LatLon {
    fn lat(&self) -> f64;
    fn lon(&self) -> f64;
}

/// `(latitude, longitude)` tuples.
impl LatLon for (f64, f64) {
    fn lat(&self) -> f64 {
        self.0
    }

    fn lon(&self) -> f64 {
        self.1
    }
}

impl<T: LatLon> LatLon for &T {
    fn lat(&self) -> f64 {
        (**self).lat()
    }

    fn lon(&self) -> f64 {
        (**self).lon()
    }
}

/// Errors raised by the geometry kernel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("cannot compute bounds of an empty point set")]
    EmptyInput,
}
