//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::kpi::KpiSource;
use crate::quality::QualityConfig;
use crate::stream::ClusterTransport;
use crate::view::{ClusterView, ViewRegistry};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live views by id
    pub views: ViewRegistry,
    pub config: Arc<AppConfig>,
    /// Shared, immutable quality ladders and palettes
    pub quality: Arc<QualityConfig>,
    /// Opens producer channels; each view gets its own client on top
    pub transport: Arc<dyn ClusterTransport>,
    pub kpi: Option<Arc<dyn KpiSource>>,
}

impl AppState {
    pub fn new(config: AppConfig, quality: QualityConfig, transport: Arc<dyn ClusterTransport>) -> Self {
        Self {
            views: ViewRegistry::new(),
            config: Arc::new(config),
            quality: Arc::new(quality),
            transport,
            kpi: None,
        }
    }

    pub fn with_kpi_source(mut self, source: Arc<dyn KpiSource>) -> Self {
        self.kpi = Some(source);
        self
    }

    /// A fresh, unopened view configured from this state.
    pub fn new_view(&self) -> ClusterView {
        let view = ClusterView::new(
            Arc::clone(&self.transport),
            self.config.client_options(),
            Arc::clone(&self.quality),
            self.config.render_style(),
        );
        match self.kpi.as_ref() {
            Some(kpi) => view.with_kpi_source(Arc::clone(kpi)),
            None => view,
        }
    }
}
