//! Point-in-polygon on surface coordinates.

use super::ScreenPoint;

/// Even-odd ray casting. Polygons with fewer than 3 vertices contain nothing.
pub fn point_in_polygon(point: ScreenPoint, polygon: &[ScreenPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
