//! One-shot clustering KPI results (elbow method, silhouette score).

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ClusterId;

/// Fit error per candidate cluster count, plus the recommended count.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElbowResult {
    /// Candidate K to sum of squared errors.
    #[serde(deserialize_with = "sse_map_or_list")]
    pub sse_values: BTreeMap<u32, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_k: Option<u32>,
}

/// Accept `{"2": 10.5, ...}` or `[12.0, 10.5, ...]` (index 0 is K = 1).
fn sse_map_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<u32, f64>, D::Error> {
    let number = |v: &Value| {
        v.as_f64()
            .ok_or_else(|| D::Error::custom(format!("sse value must be a number, got {}", v)))
    };

    match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let k = k
                    .parse::<u32>()
                    .map_err(|_| D::Error::custom(format!("invalid cluster count key '{}'", k)))?;
                Ok((k, number(v)?))
            })
            .collect(),
        Value::Array(values) => values
            .iter()
            .enumerate()
            .map(|(i, v)| Ok((i as u32 + 1, number(v)?)))
            .collect(),
        other => Err(D::Error::custom(format!(
            "sseValues must be an object or an array, got {}",
            other
        ))),
    }
}

impl ElbowResult {
    /// The producer's recommendation, else the K with the sharpest bend.
    pub fn recommended_k(&self) -> Option<u32> {
        if self.optimal_k.is_some() {
            return self.optimal_k;
        }
        let points: Vec<(u32, f64)> = self.sse_values.iter().map(|(k, v)| (*k, *v)).collect();
        points
            .windows(3)
            .map(|w| (w[1].0, (w[0].1 - w[1].1) - (w[1].1 - w[2].1)))
            .filter(|(_, bend)| *bend > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| k)
    }
}

/// Overall and per-cluster silhouette scores, each in [-1, 1].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilhouetteResult {
    pub overall_score: f64,
    #[serde(default)]
    pub per_cluster_scores: BTreeMap<ClusterId, f64>,
}

/// Auxiliary panel data loaded once per parameter change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiPanels {
    pub elbow: Option<ElbowResult>,
    pub silhouette: Option<SilhouetteResult>,
}

impl KpiPanels {
    pub fn is_empty(&self) -> bool {
        self.elbow.is_none() && self.silhouette.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elbow_from_object() {
        let r: ElbowResult =
            serde_json::from_str(r#"{"sseValues": {"1": 100.0, "2": 40.0, "3": 30.0}, "optimalK": 2}"#).unwrap();
        assert_eq!(r.sse_values.len(), 3);
        assert_eq!(r.sse_values[&2], 40.0);
        assert_eq!(r.recommended_k(), Some(2));
    }

    #[test]
    fn test_elbow_from_array() {
        let r: ElbowResult = serde_json::from_str(r#"{"sseValues": [100.0, 40.0, 30.0, 25.0]}"#).unwrap();
        assert_eq!(r.sse_values.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(r.optimal_k, None);
        // Bend at K=2: (100-40) - (40-30) = 50.
        assert_eq!(r.recommended_k(), Some(2));
    }

    #[test]
    fn test_elbow_too_short_has_no_recommendation() {
        let r: ElbowResult = serde_json::from_str(r#"{"sseValues": [10.0, 5.0]}"#).unwrap();
        assert_eq!(r.recommended_k(), None);
    }

    #[test]
    fn test_silhouette_parses_per_cluster() {
        let s: SilhouetteResult =
            serde_json::from_str(r#"{"overallScore": 0.61, "perClusterScores": {"0": 0.7, "1": 0.5}}"#).unwrap();
        assert_eq!(s.overall_score, 0.61);
        assert_eq!(s.per_cluster_scores[&ClusterId(1)], 0.5);
    }
}
