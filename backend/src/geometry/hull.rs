//! Convex hull construction (monotone chain).

use std::cmp::Ordering;

use super::LatLon;

/// Cross product of `o->a` and `o->b` with longitude as x and latitude as y.
///
/// Positive for a counter-clockwise turn.
pub(crate) fn cross(o: &impl LatLon, a: &impl LatLon, b: &impl LatLon) -> f64 {
    (a.lon() - o.lon()) * (b.lat() - o.lat()) - (a.lat() - o.lat()) * (b.lon() - o.lon())
}

fn by_lat_then_lon(a: &impl LatLon, b: &impl LatLon) -> Ordering {
    a.lat()
        .total_cmp(&b.lat())
        .then_with(|| a.lon().total_cmp(&b.lon()))
}

fn same_position(a: &impl LatLon, b: &impl LatLon) -> bool {
    a.lat() == b.lat() && a.lon() == b.lon()
}

/// Convex hull of `points`, counter-clockwise in (lon, lat) space.
///
/// Points are sorted by latitude then longitude (stable, so exact duplicates
/// keep their input order) and swept into lower and upper chains; any vertex
/// that does not make a strict left turn is discarded, which also removes
/// duplicates and collinear interior points.
///
/// Fewer than 3 distinct points returns the input unchanged. Callers should
/// treat any result shorter than 3 as "not a polygon". All-collinear input
/// returns the two extreme points.
pub fn convex_hull<P: LatLon + Clone>(points: &[P]) -> Vec<P> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted: Vec<&P> = points.iter().collect();
    sorted.sort_by(|a, b| by_lat_then_lon(*a, *b));

    let distinct = 1 + sorted
        .windows(2)
        .filter(|w| !same_position(w[0], w[1]))
        .count();
    if distinct < 3 {
        return points.to_vec();
    }

    let mut lower: Vec<&P> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<&P> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();

    lower.into_iter().chain(upper).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_with_interior_point() {
        let pts = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.5, 0.5)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&(0.5, 0.5)));
        // Starts at the lowest latitude, lowest longitude corner.
        assert_eq!(hull[0], (0.0, 0.0));
    }

    #[test]
    fn test_hull_is_counter_clockwise() {
        let pts = vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (1.0, 3.0)];
        let hull = convex_hull(&pts);
        let n = hull.len();
        for i in 0..n {
            let turn = cross(&hull[i], &hull[(i + 1) % n], &hull[(i + 2) % n]);
            assert!(turn > 0.0, "vertex {} does not turn left", i);
        }
    }

    #[test]
    fn test_fewer_than_three_points_unchanged() {
        let pts = vec![(3.0, 1.0), (1.0, 2.0)];
        assert_eq!(convex_hull(&pts), pts);
        let empty: Vec<(f64, f64)> = vec![];
        assert!(convex_hull(&empty).is_empty());
    }

    #[test]
    fn test_duplicates_with_two_distinct_positions_unchanged() {
        let pts = vec![(1.0, 1.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)];
        assert_eq!(convex_hull(&pts), pts);
    }

    #[test]
    fn test_collinear_returns_extremes() {
        let pts = vec![(1.0, 1.0), (3.0, 3.0), (0.0, 0.0), (2.0, 2.0)];
        assert_eq!(convex_hull(&pts), vec![(0.0, 0.0), (3.0, 3.0)]);
    }

    #[test]
    fn test_collinear_edge_points_dropped() {
        let pts = vec![(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (2.0, 0.0), (2.0, 2.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&(0.0, 1.0)));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let pts = vec![(0.3, 0.1), (0.9, 0.4), (0.2, 0.8), (0.5, 0.5), (0.7, 0.9)];
        let first = convex_hull(&pts);
        for _ in 0..5 {
            assert_eq!(convex_hull(&pts), first);
        }
    }
}
