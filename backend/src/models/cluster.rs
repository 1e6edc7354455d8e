//! Cluster snapshot model.
//!
//! A [`ClusterUpdate`] is one complete snapshot pushed by the producer. Newer
//! snapshots replace older ones wholesale; nothing is merged.

use serde::{Deserialize, Serialize};

use crate::geometry::LatLon;
use crate::quality::{MetricKind, QualityTier};

crate::define_id_type!(u32, ClusterId);

/// A single measurement. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsrp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsrq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sinr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cqi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<ClusterId>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            rsrp: None,
            rsrq: None,
            sinr: None,
            cqi: None,
            pci: None,
            cell_id: None,
            cluster_id: None,
            timestamp: None,
        }
    }

    pub fn with_cluster(mut self, id: u32) -> Self {
        self.cluster_id = Some(ClusterId(id));
        self
    }

    pub fn with_rsrp(mut self, rsrp: f64) -> Self {
        self.rsrp = Some(rsrp);
        self
    }

    pub fn metric(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Rsrp => self.rsrp,
            MetricKind::Rsrq => self.rsrq,
            MetricKind::Sinr => self.sinr,
        }
    }
}

impl LatLon for GeoPoint {
    fn lat(&self) -> f64 {
        self.latitude
    }

    fn lon(&self) -> f64 {
        self.longitude
    }
}

/// Aggregate over the points sharing one cluster id.
///
/// The centroid comes from the producer. Color is not stored; it is derived
/// from `quality` and the active scheme at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterZone {
    #[serde(rename = "clusterId")]
    pub id: ClusterId,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub point_count: usize,
    pub quality: QualityTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rsrp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rsrq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_sinr: Option<f64>,
}

impl ClusterZone {
    pub fn new(id: u32, centroid_lat: f64, centroid_lon: f64, point_count: usize, quality: QualityTier) -> Self {
        Self {
            id: ClusterId(id),
            centroid_lat,
            centroid_lon,
            point_count,
            quality,
            avg_rsrp: None,
            avg_rsrq: None,
            avg_sinr: None,
        }
    }

    /// Zones without points are never drawn.
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    pub fn average(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Rsrp => self.avg_rsrp,
            MetricKind::Rsrq => self.avg_rsrq,
            MetricKind::Sinr => self.avg_sinr,
        }
    }

    fn average_mut(&mut self, kind: MetricKind) -> &mut Option<f64> {
        match kind {
            MetricKind::Rsrp => &mut self.avg_rsrp,
            MetricKind::Rsrq => &mut self.avg_rsrq,
            MetricKind::Sinr => &mut self.avg_sinr,
        }
    }
}

impl LatLon for ClusterZone {
    fn lat(&self) -> f64 {
        self.centroid_lat
    }

    fn lon(&self) -> f64 {
        self.centroid_lon
    }
}

/// One snapshot of every zone for a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterUpdate {
    pub update_id: String,
    pub source_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub zones: Vec<ClusterZone>,
    pub total_points: usize,
    /// Raw points, flattened. Empty when the producer sends only aggregates.
    #[serde(default)]
    pub points: Vec<GeoPoint>,
    /// Auxiliary producer data. Never projected onto the map.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ClusterUpdate {
    pub fn zone(&self, id: ClusterId) -> Option<&ClusterZone> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Zones with at least one point, in snapshot order.
    pub fn non_empty_zones(&self) -> impl Iterator<Item = &ClusterZone> {
        self.zones.iter().filter(|z| !z.is_empty())
    }

    pub fn points_of(&self, id: ClusterId) -> impl Iterator<Item = &GeoPoint> {
        self.points.iter().filter(move |p| p.cluster_id == Some(id))
    }

    /// No zone has any points.
    pub fn is_empty(&self) -> bool {
        self.non_empty_zones().next().is_none()
    }

    pub fn zone_point_sum(&self) -> usize {
        self.zones.iter().map(|z| z.point_count).sum()
    }

    /// Whether zone counts add up to `total_points`, and, when raw points
    /// are present, whether each zone's count matches its members.
    pub fn is_consistent(&self) -> bool {
        self.zone_point_sum() == self.total_points && self.count_mismatches().is_empty()
    }

    /// Zones whose `point_count` disagrees with the raw points carried.
    pub fn count_mismatches(&self) -> Vec<ClusterId> {
        if self.points.is_empty() {
            return Vec::new();
        }
        self.zones
            .iter()
            .filter(|z| self.points_of(z.id).count() != z.point_count)
            .map(|z| z.id)
            .collect()
    }

    /// Ordering rule: a strictly later timestamp wins; an equal timestamp
    /// wins only when it is a different update.
    pub fn supersedes(&self, current: &ClusterUpdate) -> bool {
        self.timestamp > current.timestamp
            || (self.timestamp == current.timestamp && self.update_id != current.update_id)
    }

    /// Fill zone averages the producer omitted from the member points.
    pub fn derive_missing_averages(&mut self) {
        if self.points.is_empty() {
            return;
        }
        for zone in &mut self.zones {
            for kind in MetricKind::ALL {
                if zone.average(kind).is_some() {
                    continue;
                }
                let (sum, n) = self
                    .points
                    .iter()
                    .filter(|p| p.cluster_id == Some(zone.id))
                    .filter_map(|p| p.metric(kind))
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n > 0 {
                    *zone.average_mut(kind) = Some(sum / n as f64);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(ts: i64, id: &str) -> ClusterUpdate {
        ClusterUpdate {
            update_id: id.to_string(),
            source_id: "dev-1".to_string(),
            timestamp: ts,
            zones: vec![
                ClusterZone::new(0, 1.0, 2.0, 2, QualityTier::Good),
                ClusterZone::new(1, 1.5, 2.5, 1, QualityTier::Poor),
                ClusterZone::new(2, 0.0, 0.0, 0, QualityTier::Fair),
            ],
            total_points: 3,
            points: vec![
                GeoPoint::new(1.0, 2.0).with_cluster(0).with_rsrp(-90.0),
                GeoPoint::new(1.1, 2.1).with_cluster(0).with_rsrp(-100.0),
                GeoPoint::new(1.5, 2.5).with_cluster(1),
            ],
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_supersedes_by_timestamp_then_id() {
        let a = update(100, "a");
        assert!(update(101, "b").supersedes(&a));
        assert!(update(100, "b").supersedes(&a));
        assert!(!update(100, "a").supersedes(&a));
        assert!(!update(99, "c").supersedes(&a));
    }

    #[test]
    fn test_non_empty_zones_skip_zero_count() {
        let u = update(1, "a");
        let ids: Vec<u32> = u.non_empty_zones().map(|z| z.id.value()).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(!u.is_empty());
    }

    #[test]
    fn test_consistency_checks() {
        let mut u = update(1, "a");
        assert!(u.is_consistent());
        u.total_points = 5;
        assert!(!u.is_consistent());
        u.total_points = 3;
        u.zones[1].point_count = 4;
        assert_eq!(u.count_mismatches(), vec![ClusterId(1)]);
    }

    #[test]
    fn test_derive_missing_averages() {
        let mut u = update(1, "a");
        u.zones[0].avg_sinr = Some(12.0);
        u.derive_missing_averages();
        assert_eq!(u.zones[0].avg_rsrp, Some(-95.0));
        assert_eq!(u.zones[0].avg_sinr, Some(12.0));
        assert_eq!(u.zones[1].avg_rsrp, None);
    }

    #[test]
    fn test_zone_serializes_camel_case() {
        let z = ClusterZone::new(3, 1.0, 2.0, 4, QualityTier::Excellent);
        let json = serde_json::to_value(&z).unwrap();
        assert_eq!(json["clusterId"], 3);
        assert_eq!(json["centroidLat"], 1.0);
        assert_eq!(json["quality"], "Excellent");
        assert!(json.get("avgRsrp").is_none());
    }
}
