use crate::geometry::{point_in_polygon, projected_hull, ProjectionContext, ScreenPoint};
use crate::models::{ClusterUpdate, ClusterZone};
use crate::render::RenderStyle;

/// Resolve a pointer position to a rendered zone.
///
/// Zones with a hull are hit when the pointer is inside the projected hull;
/// when hulls overlap the zone whose centroid is closest wins. Zones with
/// fewer than three points are hit within `style.hit_radius` of their
/// centroid. Empty zones and zones hidden by the tier filter are never hit.
pub fn hit_test<'a>(
    x: f64,
    y: f64,
    update: &'a ClusterUpdate,
    ctx: &ProjectionContext,
    style: &RenderStyle,
) -> Option<&'a ClusterZone> {
    let pointer = ScreenPoint::new(x, y);
    let mut inside: Option<(f64, &ClusterZone)> = None;
    let mut near: Option<(f64, &ClusterZone)> = None;

    for zone in update.non_empty_zones().filter(|z| style.shows_tier(&z.quality)) {
        let members: Vec<_> = update.points_of(zone.id).collect();
        let distance = ctx.project(zone).distance_to(&pointer);

        match projected_hull(&members, ctx) {
            Some(hull) => {
                if point_in_polygon(pointer, &hull) && inside.map_or(true, |(d, _)| distance < d) {
                    inside = Some((distance, zone));
                }
            }
            None => {
                if distance <= style.hit_radius && near.map_or(true, |(d, _)| distance < d) {
                    near = Some((distance, zone));
                }
            }
        }
    }

    inside.or(near).map(|(_, zone)| zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{compute_bounds, SurfaceSize};
    use crate::models::{ClusterId, GeoPoint};
    use crate::quality::QualityTier;

    /// Zone 0 is a square with corners at lat/lon 0 and 10, zone 1 a single
    /// point at (20, 20).
    fn update() -> ClusterUpdate {
        let corners = [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)];
        let mut points: Vec<GeoPoint> = corners
            .iter()
            .map(|(lat, lon)| GeoPoint::new(*lat, *lon).with_cluster(0))
            .collect();
        points.push(GeoPoint::new(20.0, 20.0).with_cluster(1));
        ClusterUpdate {
            update_id: "u".into(),
            source_id: "s".into(),
            timestamp: 1,
            zones: vec![
                ClusterZone::new(0, 5.0, 5.0, 4, QualityTier::Good),
                ClusterZone::new(1, 20.0, 20.0, 1, QualityTier::Poor),
                ClusterZone::new(2, 15.0, 15.0, 0, QualityTier::Fair),
            ],
            total_points: 5,
            points,
            metadata: Default::default(),
        }
    }

    /// 200x200 surface with no padding over lat/lon 0..20: one degree is 10 px.
    fn ctx(u: &ClusterUpdate) -> ProjectionContext {
        let bounds = compute_bounds(u.points.iter()).unwrap();
        ProjectionContext::new(bounds, SurfaceSize::new(200.0, 200.0), 0.0)
    }

    #[test]
    fn test_click_inside_hull_selects_zone() {
        let u = update();
        let c = ctx(&u);
        // lat 2, lon 8 -> x 80, y 180
        let hit = hit_test(80.0, 180.0, &u, &c, &RenderStyle::default()).unwrap();
        assert_eq!(hit.id, ClusterId(0));
    }

    #[test]
    fn test_small_zone_hit_within_radius() {
        let u = update();
        let c = ctx(&u);
        let style = RenderStyle::default();
        assert_eq!(hit_test(195.0, 5.0, &u, &c, &style).map(|z| z.id), Some(ClusterId(1)));
        assert!(hit_test(150.0, 50.0, &u, &c, &style).is_none());
    }

    #[test]
    fn test_empty_zone_never_hit() {
        let u = update();
        let c = ctx(&u);
        // Centroid of the empty zone sits at (150, 50).
        assert!(hit_test(150.0, 50.0, &u, &c, &RenderStyle::default()).is_none());
    }

    #[test]
    fn test_hidden_tier_not_hit() {
        let u = update();
        let c = ctx(&u);
        let style = RenderStyle::default().with_tier_filter([QualityTier::Poor]);
        assert!(hit_test(80.0, 180.0, &u, &c, &style).is_none());
        assert!(hit_test(200.0, 0.0, &u, &c, &style).is_some());
    }

    #[test]
    fn test_overlapping_hulls_prefer_nearest_centroid() {
        let mut u = update();
        // A second square overlapping the right half of zone 0.
        for (lat, lon) in [(0.0, 5.0), (0.0, 15.0), (10.0, 15.0), (10.0, 5.0)] {
            u.points.push(GeoPoint::new(lat, lon).with_cluster(3));
        }
        u.zones.push(ClusterZone::new(3, 5.0, 10.0, 4, QualityTier::Excellent));
        u.total_points += 4;
        let c = ctx(&u);

        // lat 5, lon 9 -> closer to zone 3's centroid at lon 10.
        let pointer = c.project(&(5.0, 9.0));
        let hit = hit_test(pointer.x, pointer.y, &u, &c, &RenderStyle::default()).unwrap();
        assert_eq!(hit.id, ClusterId(3));

        let pointer = c.project(&(5.0, 6.0));
        let hit = hit_test(pointer.x, pointer.y, &u, &c, &RenderStyle::default()).unwrap();
        assert_eq!(hit.id, ClusterId(0));
    }
}
