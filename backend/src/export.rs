//! Snapshot exports: zone and point CSV, GeoJSON.
//!
//! Exports read whatever snapshot they are handed. An empty or missing
//! snapshot yields a header-only CSV and an empty feature collection.

use std::fmt::Write;

use serde_json::{json, Value};

use crate::models::{ClusterUpdate, GeoPoint};
use crate::quality::QualityConfig;

pub const ZONES_CSV_HEADER: &str = "cluster_id,quality,centroid_lat,centroid_lon,point_count,avg_rsrp,avg_rsrq,avg_sinr";
pub const POINTS_CSV_HEADER: &str = "latitude,longitude,cluster,quality";

/// Quote a CSV field when it needs it.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per non-empty zone.
pub fn zones_csv(update: Option<&ClusterUpdate>) -> String {
    let mut out = String::from(ZONES_CSV_HEADER);
    out.push('\n');
    for zone in update.into_iter().flat_map(|u| u.non_empty_zones()) {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            zone.id,
            field(zone.quality.as_str()),
            zone.centroid_lat,
            zone.centroid_lon,
            zone.point_count,
            optional(zone.avg_rsrp),
            optional(zone.avg_rsrq),
            optional(zone.avg_sinr),
        );
    }
    out
}

/// Tier name of the zone owning `point`, empty when it belongs to none.
fn point_quality<'a>(update: &'a ClusterUpdate, point: &GeoPoint) -> &'a str {
    point
        .cluster_id
        .and_then(|id| update.zone(id))
        .map_or("", |z| z.quality.as_str())
}

/// One row per raw point.
pub fn points_csv(update: Option<&ClusterUpdate>) -> String {
    let mut out = String::from(POINTS_CSV_HEADER);
    out.push('\n');
    if let Some(update) = update {
        for p in &update.points {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                p.latitude,
                p.longitude,
                p.cluster_id.map(|c| c.to_string()).unwrap_or_default(),
                field(point_quality(update, p)),
            );
        }
    }
    out
}

/// Centroid features for non-empty zones, then one feature per raw point.
pub fn geojson(update: Option<&ClusterUpdate>, quality: &QualityConfig, scheme: &str) -> Value {
    let mut features = Vec::new();

    if let Some(update) = update {
        for zone in update.non_empty_zones() {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [zone.centroid_lon, zone.centroid_lat],
                },
                "properties": {
                    "cluster": zone.id,
                    "quality": zone.quality.as_str(),
                    "color": quality.color_for(&zone.quality, scheme).to_string(),
                    "pointCount": zone.point_count,
                    "avgRsrp": zone.avg_rsrp,
                    "avgRsrq": zone.avg_rsrq,
                    "avgSinr": zone.avg_sinr,
                },
            }));
        }
        for p in &update.points {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [p.longitude, p.latitude],
                },
                "properties": {
                    "cluster": p.cluster_id,
                    "quality": point_quality(update, p),
                },
            }));
        }
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
