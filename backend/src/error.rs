//! Error types for the cluster visualizer.
//!
//! Module-local errors (geometry, transport, decode) convert into [`VizError`],
//! which carries structured context for logging and for the HTTP layer.

use std::fmt;

use crate::geometry::GeometryError;
use crate::stream::{DecodeError, TransportError};

/// Result type for visualizer operations
pub type VizResult<T> = Result<T, VizError>;

/// Structured context for visualizer errors.
///
/// Describes where an error occurred and whether retrying can help.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "open_subscription", "fetch_elbow")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "view", "snapshot", "scheme")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the entity ID.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.entity.is_none()
            && self.entity_id.is_none()
            && self.details.is_none()
            && !self.retryable
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, " [{}]", parts.join(", "))
    }
}

/// Error type for visualizer operations
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// The push channel failed to open or dropped.
    #[error("Transport error: {message}{context}")]
    Transport {
        message: String,
        context: ErrorContext,
    },

    /// A message arrived but was not a valid snapshot.
    #[error("Decode error: {message}{context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// Nothing to compute bounds or render from.
    #[error("Empty input: {message}{context}")]
    EmptyInput {
        message: String,
        context: ErrorContext,
    },

    /// Subscription or request parameters out of range.
    #[error("Invalid parameters: {message}{context}")]
    InvalidParameters {
        message: String,
        context: ErrorContext,
    },

    /// Configuration file or environment problem.
    #[error("Configuration error: {message}{context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Requested color scheme is not configured.
    #[error("Unknown color scheme: {message}{context}")]
    UnknownScheme {
        message: String,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("Not found: {message}{context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message}{context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl VizError {
    /// Create a transport error. Transport failures are retryable.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an empty-input error.
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an invalid-parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error with context.
    pub fn configuration_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Configuration {
            message: message.into(),
            context,
        }
    }

    /// Create an unknown-scheme error.
    pub fn unknown_scheme(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::UnknownScheme {
            context: ErrorContext::default()
                .with_entity("scheme")
                .with_entity_id(&name),
            message: name,
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a not found error with context.
    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Transport { context, .. }
            | Self::Decode { context, .. }
            | Self::EmptyInput { context, .. }
            | Self::InvalidParameters { context, .. }
            | Self::Configuration { context, .. }
            | Self::UnknownScheme { context, .. }
            | Self::NotFound { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Transport { context, .. }
            | Self::Decode { context, .. }
            | Self::EmptyInput { context, .. }
            | Self::InvalidParameters { context, .. }
            | Self::Configuration { context, .. }
            | Self::UnknownScheme { context, .. }
            | Self::NotFound { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    /// Attach the operation name to this error's context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Attach free-form details to this error's context.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.context_mut().details = Some(details.into());
        self
    }

    /// Attach the entity id to this error's context.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.context_mut().entity_id = Some(id.to_string());
        self
    }
}

impl From<GeometryError> for VizError {
    fn from(err: GeometryError) -> Self {
        VizError::empty_input(err.to_string())
    }
}

impl From<TransportError> for VizError {
    fn from(err: TransportError) -> Self {
        VizError::transport(err.to_string())
    }
}

impl From<DecodeError> for VizError {
    fn from(err: DecodeError) -> Self {
        VizError::decode(err.to_string())
    }
}

impl From<std::io::Error> for VizError {
    fn from(err: std::io::Error) -> Self {
        VizError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display_lists_set_fields() {
        let ctx = ErrorContext::new("open_subscription")
            .with_entity("view")
            .with_entity_id("abc")
            .retryable();
        assert_eq!(
            ctx.to_string(),
            " [operation=open_subscription, entity=view, id=abc, retryable=true]"
        );
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        let err = VizError::decode("bad json");
        assert_eq!(err.to_string(), "Decode error: bad json");
    }

    #[test]
    fn test_transport_is_retryable() {
        assert!(VizError::transport("reset").is_retryable());
        assert!(!VizError::decode("x").is_retryable());
    }

    #[test]
    fn test_with_operation_sets_context() {
        let err = VizError::not_found("view").with_operation("get_view");
        assert_eq!(err.context().operation.as_deref(), Some("get_view"));
        assert!(err.to_string().contains("operation=get_view"));
    }

    #[test]
    fn test_unknown_scheme_carries_name() {
        let err = VizError::unknown_scheme("magma");
        assert!(matches!(err, VizError::UnknownScheme { .. }));
        assert_eq!(err.context().entity_id.as_deref(), Some("magma"));
    }

    #[test]
    fn test_geometry_error_converts_to_empty_input() {
        let err: VizError = GeometryError::EmptyInput.into();
        assert!(matches!(err, VizError::EmptyInput { .. }));
    }
}
