//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::VizError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Error from the visualizer core
    Viz(VizError),
}

impl AppError {
    pub fn view_not_found(view_id: &str) -> Self {
        AppError::NotFound(format!("View {} not found", view_id))
    }
}

fn viz_status(err: &VizError) -> (StatusCode, &'static str) {
    match err {
        VizError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        VizError::InvalidParameters { .. } => (StatusCode::BAD_REQUEST, "INVALID_PARAMETERS"),
        VizError::UnknownScheme { .. } => (StatusCode::BAD_REQUEST, "UNKNOWN_SCHEME"),
        VizError::Decode { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
        VizError::Transport { .. } => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR"),
        VizError::EmptyInput { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_INPUT"),
        VizError::Configuration { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
        VizError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Viz(e) => {
                let (status, code) = viz_status(&e);
                let details = e.context().to_string();
                let mut error = ApiError::new(code, e.to_string());
                if !details.is_empty() {
                    error = error.with_details(details.trim().to_string());
                }
                (status, error)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<VizError> for AppError {
    fn from(err: VizError) -> Self {
        AppError::Viz(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viz_errors_map_to_status_codes() {
        let cases = [
            (VizError::unknown_scheme("sepia"), StatusCode::BAD_REQUEST),
            (VizError::invalid_parameters("k"), StatusCode::BAD_REQUEST),
            (VizError::not_found("view"), StatusCode::NOT_FOUND),
            (VizError::transport("down"), StatusCode::BAD_GATEWAY),
            (VizError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
