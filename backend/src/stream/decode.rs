//! Snapshot payload decoding.
//!
//! The producer's JSON is looser than [`ClusterUpdate`]: centroids come under
//! two names, raw points may be top-level or nested per zone, and a few
//! fields are optional. Everything is normalised here so the rest of the
//! crate sees one shape.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::DecodeError;
use crate::models::{ClusterId, ClusterUpdate, ClusterZone, GeoPoint};
use crate::quality::{Ladders, MetricKind, QualityTier};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUpdate {
    update_id: String,
    #[serde(default, alias = "deviceId")]
    source_id: Option<String>,
    /// Producer-side stream session; not the source.
    #[serde(default)]
    session_id: Option<String>,
    timestamp: i64,
    zones: Vec<WireZone>,
    #[serde(default)]
    total_points: Option<usize>,
    #[serde(default)]
    points: Vec<WirePoint>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireZone {
    #[serde(alias = "id")]
    cluster_id: u32,
    #[serde(alias = "centerLat")]
    centroid_lat: f64,
    #[serde(alias = "centerLon")]
    centroid_lon: f64,
    #[serde(default)]
    point_count: Option<usize>,
    #[serde(default)]
    quality: Option<QualityTier>,
    #[serde(default)]
    avg_rsrp: Option<f64>,
    #[serde(default)]
    avg_rsrq: Option<f64>,
    #[serde(default)]
    avg_sinr: Option<f64>,
    #[serde(default)]
    points: Vec<WirePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePoint {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
    #[serde(default)]
    rsrp: Option<f64>,
    #[serde(default)]
    rsrq: Option<f64>,
    #[serde(default)]
    sinr: Option<f64>,
    #[serde(default)]
    cqi: Option<i32>,
    #[serde(default)]
    pci: Option<i32>,
    #[serde(default, deserialize_with = "string_or_number")]
    cell_id: Option<String>,
    #[serde(default)]
    cluster_id: Option<u32>,
    #[serde(default, deserialize_with = "epoch_millis")]
    timestamp: Option<i64>,
}

/// Cell ids arrive as hex strings or as plain numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Integer millis; anything else (ISO strings from older producers) is dropped.
fn epoch_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

fn check_coordinates(what: &str, lat: f64, lon: f64) -> Result<(), DecodeError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(DecodeError::Invalid(format!(
            "{} coordinates out of range: ({}, {})",
            what, lat, lon
        )))
    }
}

impl WirePoint {
    fn into_point(self, zone: Option<u32>) -> Result<GeoPoint, DecodeError> {
        check_coordinates("point", self.latitude, self.longitude)?;
        Ok(GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            rsrp: self.rsrp,
            rsrq: self.rsrq,
            sinr: self.sinr,
            cqi: self.cqi,
            pci: self.pci,
            cell_id: self.cell_id,
            cluster_id: self.cluster_id.or(zone).map(ClusterId),
            timestamp: self.timestamp,
        })
    }
}

/// Decode one snapshot payload.
///
/// A missing tier is derived from the zone's mean RSRP against `ladders`; a
/// missing point count is the number of nested points; a missing total is
/// the sum of zone counts. Zone averages the producer omitted are filled from
/// member points.
///
/// The source is the top-level `sourceId`/`deviceId`, else `metadata.deviceId`.
/// A `sessionId` names the producer's stream session and is kept in metadata.
///
/// # Errors
/// [`DecodeError::Json`] for syntax or shape problems and
/// [`DecodeError::Invalid`] for out-of-range coordinates or duplicate zone ids.
pub fn decode_update(data: &str, ladders: &Ladders) -> Result<ClusterUpdate, DecodeError> {
    let wire: WireUpdate = serde_json::from_str(data)?;

    let mut seen = HashSet::new();
    let mut zones = Vec::with_capacity(wire.zones.len());
    let mut points = Vec::new();

    for zone in wire.zones {
        if !seen.insert(zone.cluster_id) {
            return Err(DecodeError::Invalid(format!(
                "duplicate cluster id {}",
                zone.cluster_id
            )));
        }
        check_coordinates("centroid", zone.centroid_lat, zone.centroid_lon)?;

        let nested = zone.points.len();
        for p in zone.points {
            points.push(p.into_point(Some(zone.cluster_id))?);
        }

        let quality = zone.quality.unwrap_or_else(|| match zone.avg_rsrp {
            Some(rsrp) => ladders.get(MetricKind::Rsrp).classify(rsrp),
            None => QualityTier::Unknown("Unknown".to_string()),
        });

        zones.push(ClusterZone {
            id: ClusterId(zone.cluster_id),
            centroid_lat: zone.centroid_lat,
            centroid_lon: zone.centroid_lon,
            point_count: zone.point_count.unwrap_or(nested),
            quality,
            avg_rsrp: zone.avg_rsrp,
            avg_rsrq: zone.avg_rsrq,
            avg_sinr: zone.avg_sinr,
        });
    }

    for p in wire.points {
        points.push(p.into_point(None)?);
    }

    let total_points = wire
        .total_points
        .unwrap_or_else(|| zones.iter().map(|z| z.point_count).sum());

    let mut metadata = wire.metadata.unwrap_or_default();
    let source_id = wire
        .source_id
        .or_else(|| metadata.get("deviceId").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();
    if let Some(session) = wire.session_id {
        metadata.entry("sessionId").or_insert(Value::String(session));
    }

    let mut update = ClusterUpdate {
        update_id: wire.update_id,
        source_id,
        timestamp: wire.timestamp,
        zones,
        total_points,
        points,
        metadata,
    };
    update.derive_missing_averages();
    Ok(update)
}
