//! One-shot clustering KPI collaborators.
//!
//! The elbow and silhouette results are fetched once per parameter change,
//! never streamed. A failed fetch leaves the corresponding panel empty.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ErrorContext, VizError, VizResult};
use crate::models::{ElbowResult, KpiPanels, SilhouetteResult};
use crate::stream::SubscriptionParams;

/// Default upper bound on K for the elbow curve.
pub const DEFAULT_MAX_K: u32 = 10;

/// Source of clustering KPIs for a measurement source.
#[async_trait]
pub trait KpiSource: Send + Sync {
    async fn fetch_elbow(&self, source_id: &str, max_k: u32) -> VizResult<ElbowResult>;

    async fn fetch_silhouette(&self, source_id: &str, cluster_count: u32) -> VizResult<SilhouetteResult>;
}

/// Fetch both panels for `params`, logging and dropping failures.
pub async fn load_panels(source: &dyn KpiSource, params: &SubscriptionParams) -> KpiPanels {
    let (elbow, silhouette) = tokio::join!(
        source.fetch_elbow(&params.source_id, DEFAULT_MAX_K),
        source.fetch_silhouette(&params.source_id, params.cluster_count),
    );

    KpiPanels {
        elbow: elbow
            .map_err(|e| log::warn!("Elbow fetch failed for {}: {}", params.source_id, e))
            .ok(),
        silhouette: silhouette
            .map_err(|e| log::warn!("Silhouette fetch failed for {}: {}", params.source_id, e))
            .ok(),
    }
}

// =============================================================================
// In-memory source
// =============================================================================

/// Fixed results keyed by source id. Unknown sources are `NotFound`.
#[derive(Debug, Default)]
pub struct StaticKpiSource {
    elbow: Mutex<HashMap<String, ElbowResult>>,
    silhouette: Mutex<HashMap<String, SilhouetteResult>>,
    calls: Mutex<usize>,
}

impl StaticKpiSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_elbow(&self, source_id: impl Into<String>, result: ElbowResult) {
        self.elbow.lock().insert(source_id.into(), result);
    }

    pub fn insert_silhouette(&self, source_id: impl Into<String>, result: SilhouetteResult) {
        self.silhouette.lock().insert(source_id.into(), result);
    }

    /// Number of fetches served, successful or not.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    fn lookup<T: Clone>(&self, map: &Mutex<HashMap<String, T>>, source_id: &str, what: &str) -> VizResult<T> {
        *self.calls.lock() += 1;
        map.lock().get(source_id).cloned().ok_or_else(|| {
            VizError::not_found_with_context(
                format!("No {} result", what),
                ErrorContext::new("fetch_kpi").with_entity("source").with_entity_id(source_id),
            )
        })
    }
}

#[async_trait]
impl KpiSource for StaticKpiSource {
    async fn fetch_elbow(&self, source_id: &str, _max_k: u32) -> VizResult<ElbowResult> {
        self.lookup(&self.elbow, source_id, "elbow")
    }

    async fn fetch_silhouette(&self, source_id: &str, _cluster_count: u32) -> VizResult<SilhouetteResult> {
        self.lookup(&self.silhouette, source_id, "silhouette")
    }
}

// =============================================================================
// HTTP source
// =============================================================================

#[cfg(feature = "http-client")]
pub use self::http_source::HttpKpiSource;

#[cfg(feature = "http-client")]
mod http_source {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::de::DeserializeOwned;

    use super::KpiSource;
    use crate::error::{VizError, VizResult};
    use crate::models::{ElbowResult, SilhouetteResult};

    /// Calls `{base}/session/{id}/elbow-method` and `{base}/session/{id}/silhouette`.
    #[derive(Debug, Clone)]
    pub struct HttpKpiSource {
        client: reqwest::Client,
        base_url: reqwest::Url,
    }

    impl HttpKpiSource {
        pub fn new(base_url: &str, timeout: Duration) -> VizResult<Self> {
            let base_url = reqwest::Url::parse(base_url)
                .map_err(|e| VizError::configuration(format!("Invalid KPI url '{}': {}", base_url, e)))?;
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| VizError::internal(e.to_string()))?;
            Ok(Self { client, base_url })
        }

        pub fn url(&self, source_id: &str, endpoint: &str, query: (&str, u32)) -> VizResult<reqwest::Url> {
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| VizError::configuration(format!("KPI url '{}' cannot be a base", self.base_url)))?
                .pop_if_empty()
                .extend(["session", source_id, endpoint]);
            url.query_pairs_mut().append_pair(query.0, &query.1.to_string());
            Ok(url)
        }

        async fn get<T: DeserializeOwned>(&self, url: reqwest::Url) -> VizResult<T> {
            let target = url.to_string();
            log::debug!("Fetching {}", target);

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| VizError::transport(e.to_string()).with_operation("fetch_kpi").with_details(target.clone()))?;
            if !response.status().is_success() {
                return Err(VizError::transport(format!("status {}", response.status()))
                    .with_operation("fetch_kpi")
                    .with_details(target));
            }
            response
                .json::<T>()
                .await
                .map_err(|e| VizError::decode(e.to_string()).with_operation("fetch_kpi").with_details(target))
        }
    }

    #[async_trait]
    impl KpiSource for HttpKpiSource {
        async fn fetch_elbow(&self, source_id: &str, max_k: u32) -> VizResult<ElbowResult> {
            let url = self.url(source_id, "elbow-method", ("maxK", max_k))?;
            self.get(url).await
        }

        async fn fetch_silhouette(&self, source_id: &str, cluster_count: u32) -> VizResult<SilhouetteResult> {
            let url = self.url(source_id, "silhouette", ("numClusters", cluster_count))?;
            self.get(url).await
        }
    }
}
