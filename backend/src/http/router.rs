//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/schemes", get(handlers::list_schemes))
        // View lifecycle
        .route("/views", get(handlers::list_views).post(handlers::create_view))
        .route("/views/{view_id}", get(handlers::get_view).delete(handlers::delete_view))
        .route("/views/{view_id}/subscription", put(handlers::update_subscription))
        .route("/views/{view_id}/events", get(handlers::stream_view_events))
        // Rendering and interaction
        .route("/views/{view_id}/render.svg", get(handlers::render_svg))
        .route(
            "/views/{view_id}/select",
            post(handlers::select_zone)
                .get(handlers::get_selection)
                .delete(handlers::clear_selection),
        )
        .route("/views/{view_id}/scheme", put(handlers::set_scheme))
        .route("/views/{view_id}/filter", put(handlers::set_filter))
        .route("/views/{view_id}/kpis", get(handlers::get_kpis))
        // Exports
        .route("/views/{view_id}/export/csv", get(handlers::export_csv))
        .route("/views/{view_id}/export/geojson", get(handlers::export_geojson));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AppConfig;
    use crate::quality::QualityConfig;
    use crate::stream::ChannelTransport;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(
            AppConfig::default(),
            QualityConfig::default(),
            Arc::new(ChannelTransport::new()),
        );
        let _router = create_router(state);
    }
}
