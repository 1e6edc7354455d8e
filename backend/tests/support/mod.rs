//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Poll `cond` every few milliseconds, failing after two seconds.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// A zone payload with `n` nested points spread on a small ring around
/// the centroid.
pub fn zone(id: u32, lat: f64, lon: f64, n: usize, quality: &str) -> Value {
    let points: Vec<Value> = (0..n)
        .map(|i| {
            let a = i as f64 * std::f64::consts::TAU / n.max(1) as f64;
            let r = if n == 1 { 0.0 } else { 0.01 };
            json!({
                "latitude": lat + r * a.sin(),
                "longitude": lon + r * a.cos(),
                "rsrp": -90.0,
            })
        })
        .collect();
    json!({
        "clusterId": id,
        "centroidLat": lat,
        "centroidLon": lon,
        "quality": quality,
        "points": points,
    })
}

/// Snapshot payload for `source` made of `zones`.
pub fn snapshot(source: &str, update_id: &str, timestamp: i64, zones: Vec<Value>) -> String {
    json!({
        "updateId": update_id,
        "sessionId": format!("{}-{}", source, update_id),
        "timestamp": timestamp,
        "zones": zones,
        "metadata": {"deviceId": source},
    })
    .to_string()
}

/// Three zones with 12, 1 and 0 points.
pub fn twelve_one_zero(source: &str, update_id: &str, timestamp: i64) -> String {
    snapshot(
        source,
        update_id,
        timestamp,
        vec![
            zone(0, -6.20, 106.80, 12, "Good"),
            zone(1, -6.25, 106.85, 1, "Poor"),
            zone(2, -6.30, 106.90, 0, "Excellent"),
        ],
    )
}
