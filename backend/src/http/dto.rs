//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::ClusterZone;
use crate::quality::QualityTier;
use crate::stream::SubscriptionParams;
use crate::view::{ViewInfo, ViewStatus};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of live views
    pub views: usize,
}

/// Request body for creating a view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateViewRequest {
    #[serde(flatten)]
    pub params: SubscriptionParams,
    /// Initial color scheme; the configured default when absent
    #[serde(default)]
    pub scheme: Option<String>,
    /// Tiers to draw; every tier when absent or empty
    #[serde(default)]
    pub tiers: Vec<QualityTier>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateViewResponse {
    pub view_id: String,
    pub status: ViewStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewListResponse {
    pub views: Vec<ViewInfo>,
    pub total: usize,
}

/// Pointer position on the rendered surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionResponse {
    /// Selected zone details, `null` when the click hit nothing
    pub zone: Option<ClusterZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeRequest {
    pub scheme: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemeListResponse {
    pub schemes: Vec<String>,
    pub default: String,
}

/// Which CSV to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvKind {
    #[default]
    Zones,
    Points,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvQuery {
    #[serde(default)]
    pub kind: CsvKind,
}
