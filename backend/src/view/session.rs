use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{VizError, VizResult};
use crate::export;
use crate::interaction::{hit_test, Selection};
use crate::kpi::{load_panels, KpiSource};
use crate::models::{ClusterId, ClusterUpdate, ClusterZone, KpiPanels};
use crate::quality::{QualityConfig, QualityTier};
use crate::render::{
    DisplayList, Frame, RenderReport, RenderState, RenderStyle, RenderSurfaceManager, Surface, SvgSurface,
};
use crate::stream::{
    ClientOptions, ClusterTransport, ConnectionStatus, StreamClient, StreamState, SubscriptionHandle,
    SubscriptionParams,
};

/// Mutable per-view state. Never held across an await.
struct ViewState {
    manager: RenderSurfaceManager,
    selection: Selection,
    scheme: String,
    panels: KpiPanels,
    handle: Option<SubscriptionHandle>,
    /// The retained frame, redrawn whenever the stream revision moves.
    frame: DisplayList,
    report: RenderReport,
    /// Stream revision `frame` was drawn for; `None` forces a redraw.
    frame_revision: Option<u64>,
    /// Snapshot behind `frame`; clicks resolve against it.
    rendered: Option<Arc<ClusterUpdate>>,
}

/// Serializable summary of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatus {
    pub stream: StreamState,
    pub connected: bool,
    pub scheme: String,
    pub render_state: RenderState,
    pub selected: Option<ClusterId>,
    pub update_id: Option<String>,
    pub timestamp: Option<i64>,
    pub zone_count: usize,
    pub total_points: usize,
    pub revision: u64,
}

struct ViewInner {
    client: StreamClient,
    quality: Arc<QualityConfig>,
    state: Mutex<ViewState>,
}

impl ViewInner {
    /// Redraw the retained frame if the stream moved since it was drawn.
    fn refresh(&self) {
        let revision = self.client.revision();
        if self.state.lock().frame_revision == Some(revision) {
            return;
        }
        let latest = self.client.latest();
        let connected = self.client.state().connected();

        let mut state = self.state.lock();
        let ViewState {
            manager,
            selection,
            scheme,
            panels,
            frame,
            report,
            frame_revision,
            rendered,
            ..
        } = &mut *state;

        selection.reconcile(latest.as_deref());
        let input = Frame {
            update: latest.as_deref(),
            connected,
            quality: &self.quality,
            scheme: scheme.as_str(),
            panels: Some(&*panels),
        };
        *report = manager.render(frame, &input);
        *frame_revision = Some(revision);
        *rendered = latest;
    }

    fn invalidate(&self) {
        self.state.lock().frame_revision = None;
        self.refresh();
    }
}

/// Redraw `inner` every time its stream reports a change.
async fn redraw_on_change(inner: Weak<ViewInner>, mut changes: watch::Receiver<u64>) {
    while changes.changed().await.is_ok() {
        match inner.upgrade() {
            Some(inner) => inner.refresh(),
            None => break,
        }
    }
}

pub struct ClusterView {
    inner: Arc<ViewInner>,
    kpi: Option<Arc<dyn KpiSource>>,
    redraw: Mutex<Option<JoinHandle<()>>>,
}

impl ClusterView {
    /// A view over `transport`. Tiers missing from snapshots are derived
    /// with the ladders of `quality`.
    pub fn new(
        transport: Arc<dyn ClusterTransport>,
        mut options: ClientOptions,
        quality: Arc<QualityConfig>,
        style: RenderStyle,
    ) -> Self {
        options.ladders = quality.ladders.clone();
        let scheme = quality.default_scheme.clone();
        let frame = DisplayList::new(style.size);
        Self {
            inner: Arc::new(ViewInner {
                client: StreamClient::new(transport, options),
                quality,
                state: Mutex::new(ViewState {
                    manager: RenderSurfaceManager::new(style),
                    selection: Selection::new(),
                    scheme,
                    panels: KpiPanels::default(),
                    handle: None,
                    frame,
                    report: RenderReport::empty(),
                    frame_revision: None,
                    rendered: None,
                }),
            }),
            kpi: None,
            redraw: Mutex::new(None),
        }
    }

    /// Fetch elbow and silhouette panels from `source` on every parameter change.
    pub fn with_kpi_source(mut self, source: Arc<dyn KpiSource>) -> Self {
        self.kpi = Some(source);
        self
    }

    /// Open (or re-open with new parameters) the view's subscription.
    ///
    /// Idempotent for unchanged parameters. KPI panels are reloaded only when
    /// a new subscription actually starts. From here on the retained frame is
    /// redrawn on every accepted snapshot and status change.
    pub async fn open(&self, params: SubscriptionParams) -> VizResult<SubscriptionHandle> {
        let handle = self.inner.client.open(params).await?;
        self.ensure_redraw_task();

        let fresh = {
            let mut state = self.inner.state.lock();
            let fresh = state.handle.as_ref() != Some(&handle);
            if fresh {
                state.handle = Some(handle.clone());
                state.panels = KpiPanels::default();
                state.frame_revision = None;
            }
            fresh
        };

        if fresh {
            if let Some(source) = self.kpi.as_ref() {
                let panels = load_panels(source.as_ref(), handle.params()).await;
                let mut state = self.inner.state.lock();
                // A newer open may have replaced the handle while fetching.
                if state.handle.as_ref() == Some(&handle) {
                    state.panels = panels;
                    state.frame_revision = None;
                }
            }
        }
        self.inner.refresh();
        Ok(handle)
    }

    fn ensure_redraw_task(&self) {
        let mut redraw = self.redraw.lock();
        if redraw.as_ref().map_or(false, |task| !task.is_finished()) {
            return;
        }
        let changes = self.inner.client.subscribe_changes();
        *redraw = Some(tokio::spawn(redraw_on_change(Arc::downgrade(&self.inner), changes)));
    }

    /// Close the subscription. The last snapshot stays displayable.
    pub async fn close(&self) {
        self.inner.client.shutdown().await;
        self.inner.state.lock().handle = None;
        self.inner.refresh();
    }

    pub fn params(&self) -> Option<SubscriptionParams> {
        self.inner.state.lock().handle.as_ref().map(|h| h.params().clone())
    }

    pub fn quality(&self) -> &QualityConfig {
        &self.inner.quality
    }

    pub fn scheme(&self) -> String {
        self.inner.state.lock().scheme.clone()
    }

    /// Switch the color scheme. Positions, counts and selection are untouched.
    pub fn set_scheme(&self, name: &str) -> VizResult<()> {
        if !self.inner.quality.has_scheme(name) {
            return Err(VizError::unknown_scheme(name).with_operation("set_scheme"));
        }
        self.inner.state.lock().scheme = name.to_string();
        self.inner.invalidate();
        Ok(())
    }

    /// Restrict drawing (and hit-testing) to `tiers`; empty shows every tier.
    pub fn set_tier_filter(&self, tiers: impl IntoIterator<Item = QualityTier>) {
        {
            let mut state = self.inner.state.lock();
            let set: HashSet<QualityTier> = tiers.into_iter().collect();
            let mut style = state.manager.style().clone();
            style.tier_filter = if set.is_empty() { None } else { Some(set) };
            state.manager.set_style(style);
        }
        self.inner.invalidate();
    }

    pub fn style(&self) -> RenderStyle {
        self.inner.state.lock().manager.style().clone()
    }

    pub fn latest(&self) -> Option<Arc<ClusterUpdate>> {
        self.inner.client.latest()
    }

    pub fn kpi_panels(&self) -> KpiPanels {
        self.inner.state.lock().panels.clone()
    }

    /// Replay the current frame onto `surface`.
    pub fn render(&self, surface: &mut dyn Surface) -> RenderReport {
        self.inner.refresh();
        let state = self.inner.state.lock();
        state.frame.replay(surface);
        state.report.clone()
    }

    /// The current frame's drawing commands.
    pub fn frame(&self) -> DisplayList {
        self.inner.refresh();
        self.inner.state.lock().frame.clone()
    }

    /// Render the current frame as an SVG document.
    pub fn render_svg(&self) -> String {
        let mut svg = SvgSurface::new(self.style().size);
        self.render(&mut svg);
        svg.finish()
    }

    /// Resolve a click on the current frame.
    ///
    /// A hit selects the zone and returns its current details; a miss clears
    /// the selection. Nothing is hit while the view is empty.
    pub fn click(&self, x: f64, y: f64) -> Option<ClusterZone> {
        self.inner.refresh();
        let mut state = self.inner.state.lock();
        let hit = match (state.rendered.as_ref(), state.manager.projection()) {
            (Some(update), Some(ctx)) => {
                hit_test(x, y, update, ctx, state.manager.style()).map(|z| z.id)
            }
            _ => None,
        };

        match hit {
            Some(id) => {
                log::debug!("Click at ({:.1}, {:.1}) selected zone {}", x, y, id);
                state.selection.select(id);
            }
            None => state.selection.clear(),
        }
        drop(state);
        self.selected_zone()
    }

    /// The selected zone as it appears in the latest snapshot.
    pub fn selected_zone(&self) -> Option<ClusterZone> {
        let latest = self.inner.client.latest();
        let mut state = self.inner.state.lock();
        state.selection.reconcile(latest.as_deref());
        latest.as_deref().and_then(|u| state.selection.resolve(u)).cloned()
    }

    pub fn clear_selection(&self) {
        self.inner.state.lock().selection.clear();
    }

    pub fn export_zones_csv(&self) -> String {
        export::zones_csv(self.latest().as_deref())
    }

    pub fn export_points_csv(&self) -> String {
        export::points_csv(self.latest().as_deref())
    }

    pub fn export_geojson(&self) -> Value {
        let scheme = self.scheme();
        export::geojson(self.latest().as_deref(), &self.inner.quality, &scheme)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.inner.client.status()
    }

    pub fn status(&self) -> ViewStatus {
        self.inner.refresh();
        let latest = self.inner.client.latest();
        let stream = self.inner.client.state();
        let state = self.inner.state.lock();
        ViewStatus {
            connected: stream.connected(),
            stream,
            scheme: state.scheme.clone(),
            render_state: state.manager.state(),
            selected: state.selection.selected(),
            update_id: latest.as_ref().map(|u| u.update_id.clone()),
            timestamp: latest.as_ref().map(|u| u.timestamp),
            zone_count: latest.as_ref().map_or(0, |u| u.non_empty_zones().count()),
            total_points: latest.as_ref().map_or(0, |u| u.total_points),
            revision: self.inner.client.revision(),
        }
    }

    /// Fires whenever the snapshot or connection status changes.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.inner.client.subscribe_changes()
    }
}

impl Drop for ClusterView {
    fn drop(&mut self) {
        if let Some(task) = self.redraw.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
