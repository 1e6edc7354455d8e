//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the view
//! session object for the actual work.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;

use super::dto::{
    CreateViewRequest, CreateViewResponse, CsvKind, CsvQuery, HealthResponse, SchemeListResponse,
    SchemeRequest, SelectRequest, SelectionResponse, ViewListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::KpiPanels;
use crate::render::TierFilter;
use crate::stream::SubscriptionParams;
use crate::view::{ClusterView, ViewStatus};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn find_view(state: &AppState, view_id: &str) -> Result<Arc<ClusterView>, AppError> {
    state
        .views
        .get(view_id)
        .ok_or_else(|| AppError::view_not_found(view_id))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        views: state.views.len(),
    }))
}

/// GET /v1/schemes
pub async fn list_schemes(State(state): State<AppState>) -> HandlerResult<SchemeListResponse> {
    Ok(Json(SchemeListResponse {
        schemes: state.quality.scheme_names().map(str::to_string).collect(),
        default: state.quality.default_scheme.clone(),
    }))
}

// =============================================================================
// View lifecycle
// =============================================================================

/// GET /v1/views
pub async fn list_views(State(state): State<AppState>) -> HandlerResult<ViewListResponse> {
    let views = state.views.list();
    let total = views.len();
    Ok(Json(ViewListResponse { views, total }))
}

/// POST /v1/views
///
/// Create a view and open its subscription.
pub async fn create_view(
    State(state): State<AppState>,
    Json(request): Json<CreateViewRequest>,
) -> Result<(StatusCode, Json<CreateViewResponse>), AppError> {
    request.params.validate()?;

    let view = state.new_view();
    if let Some(scheme) = request.scheme.as_deref() {
        view.set_scheme(scheme)?;
    }
    view.set_tier_filter(request.tiers);

    let (view_id, view) = state.views.insert(view);
    if let Err(e) = view.open(request.params).await {
        state.views.remove(&view_id);
        return Err(e.into());
    }
    log::info!("Created view {}", view_id);

    Ok((
        StatusCode::CREATED,
        Json(CreateViewResponse {
            view_id,
            status: view.status(),
        }),
    ))
}

/// GET /v1/views/{view_id}
pub async fn get_view(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> HandlerResult<ViewStatus> {
    Ok(Json(find_view(&state, &view_id)?.status()))
}

/// PUT /v1/views/{view_id}/subscription
///
/// Re-open with new parameters. Unchanged parameters are a no-op.
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    Json(params): Json<SubscriptionParams>,
) -> HandlerResult<ViewStatus> {
    let view = find_view(&state, &view_id)?;
    view.open(params).await?;
    Ok(Json(view.status()))
}

/// DELETE /v1/views/{view_id}
pub async fn delete_view(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let view = state
        .views
        .remove(&view_id)
        .ok_or_else(|| AppError::view_not_found(&view_id))?;
    view.close().await;
    log::info!("Closed view {}", view_id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Rendering and interaction
// =============================================================================

/// GET /v1/views/{view_id}/render.svg
pub async fn render_svg(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = find_view(&state, &view_id)?;
    let svg = view.render_svg();
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// POST /v1/views/{view_id}/select
///
/// Resolve a click on the view's current frame.
pub async fn select_zone(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> HandlerResult<SelectionResponse> {
    if !request.x.is_finite() || !request.y.is_finite() {
        return Err(AppError::BadRequest("x and y must be finite".to_string()));
    }
    let view = find_view(&state, &view_id)?;
    Ok(Json(SelectionResponse {
        zone: view.click(request.x, request.y),
    }))
}

/// GET /v1/views/{view_id}/select
pub async fn get_selection(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> HandlerResult<SelectionResponse> {
    let view = find_view(&state, &view_id)?;
    Ok(Json(SelectionResponse {
        zone: view.selected_zone(),
    }))
}

/// DELETE /v1/views/{view_id}/select
pub async fn clear_selection(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> Result<StatusCode, AppError> {
    find_view(&state, &view_id)?.clear_selection();
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/views/{view_id}/scheme
pub async fn set_scheme(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    Json(request): Json<SchemeRequest>,
) -> HandlerResult<ViewStatus> {
    let view = find_view(&state, &view_id)?;
    view.set_scheme(&request.scheme)?;
    Ok(Json(view.status()))
}

/// PUT /v1/views/{view_id}/filter
pub async fn set_filter(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    Json(filter): Json<TierFilter>,
) -> HandlerResult<ViewStatus> {
    let view = find_view(&state, &view_id)?;
    view.set_tier_filter(filter.tiers);
    Ok(Json(view.status()))
}

/// GET /v1/views/{view_id}/kpis
pub async fn get_kpis(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> HandlerResult<KpiPanels> {
    Ok(Json(find_view(&state, &view_id)?.kpi_panels()))
}

// =============================================================================
// Exports
// =============================================================================

/// GET /v1/views/{view_id}/export/csv?kind=zones|points
pub async fn export_csv(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    Query(query): Query<CsvQuery>,
) -> Result<impl IntoResponse, AppError> {
    let view = find_view(&state, &view_id)?;
    let (body, name) = match query.kind {
        CsvKind::Zones => (view.export_zones_csv(), "zones.csv"),
        CsvKind::Points => (view.export_points_csv(), "points.csv"),
    };
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", name)),
        ],
        body,
    ))
}

/// GET /v1/views/{view_id}/export/geojson
pub async fn export_geojson(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    Ok(Json(find_view(&state, &view_id)?.export_geojson()))
}

// =============================================================================
// Change stream
// =============================================================================

/// GET /v1/views/{view_id}/events
///
/// Server-Sent Events stream of view status, one event per snapshot or
/// connectivity change. Ends when the view is deleted.
pub async fn stream_view_events(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let view = find_view(&state, &view_id)?;
    let mut changes = view.subscribe_changes();
    // Only a weak handle: the stream must not keep a deleted view alive.
    let weak = Arc::downgrade(&view);
    drop(view);

    let stream = async_stream::stream! {
        loop {
            let Some(view) = weak.upgrade() else { break };
            let status = view.status();
            drop(view);

            let event_data = serde_json::to_string(&status).unwrap_or_default();
            yield Ok(Event::default().event("status").data(event_data));

            if changes.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
