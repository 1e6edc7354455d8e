//! Stream client for live cluster snapshots.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Producer (SSE endpoint or in-memory channel)            │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │ RawMessage frames
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Subscription task (one per open handle)                  │
//! │  - decode, drop stale, silence timeout, backoff reconnect │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │ accepted ClusterUpdate + status
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  StreamClient shared state                                │
//! │  - latest snapshot, connection status, revision counter   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each [`StreamClient`] owns at most one subscription task. Opening with new
//! parameters aborts the previous task before the next one connects, and a
//! generation counter keeps a task that is being torn down from publishing.

pub mod backoff;
pub mod client;
pub mod decode;
pub mod sse;
pub mod transport;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, VizError};

pub use backoff::{retry_backoff, Backoff};
pub use client::{ClientOptions, StreamClient, StreamState, SubscriptionHandle};
pub use decode::decode_update;
pub use sse::SseDecoder;
pub use transport::{ChannelTransport, ClusterTransport, MessageStream, RawMessage};

#[cfg(feature = "http-client")]
pub use transport::SseTransport;

/// SSE event name carrying snapshots.
pub const CLUSTER_UPDATE_EVENT: &str = "cluster-update";

/// Failure to open or keep a push channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),
    #[error("producer answered with HTTP status {0}")]
    Status(u16),
    #[error("channel read failed: {0}")]
    Io(String),
    #[error("channel closed by producer")]
    Closed,
}

/// A message that is not a valid snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed snapshot JSON: {0}")]
    Json(String),
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

/// What a subscription is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionParams {
    #[serde(alias = "sessionId", alias = "deviceId")]
    pub source_id: String,
    #[serde(alias = "numClusters")]
    pub cluster_count: u32,
    #[serde(alias = "intervalSeconds")]
    pub refresh_interval_secs: u32,
}

impl SubscriptionParams {
    pub fn new(source_id: impl Into<String>, cluster_count: u32, refresh_interval_secs: u32) -> Self {
        Self {
            source_id: source_id.into(),
            cluster_count,
            refresh_interval_secs,
        }
    }

    /// Source must be non-blank, at least 2 clusters, interval at least 1 s.
    pub fn validate(&self) -> Result<(), VizError> {
        let ctx = || ErrorContext::new("validate_subscription").with_entity("subscription");
        let problem = if self.source_id.trim().is_empty() {
            Some("source id must not be empty".to_string())
        } else if self.cluster_count < 2 {
            Some(format!("cluster count must be at least 2, got {}", self.cluster_count))
        } else if self.refresh_interval_secs < 1 {
            Some("refresh interval must be at least 1 second".to_string())
        } else {
            None
        };

        match problem {
            Some(message) => Err(VizError::InvalidParameters {
                message,
                context: ctx().with_entity_id(&self.source_id),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for SubscriptionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (k={}, every {}s)",
            self.source_id, self.cluster_count, self.refresh_interval_secs
        )
    }
}

/// Connectivity of the current subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No subscription has been opened.
    Idle,
    /// Channel requested, nothing received yet.
    Connecting,
    /// Last message was a valid snapshot.
    Live,
    /// Channel open but quiet for longer than the silence timeout.
    Silent,
    /// Channel failed or ended; the last snapshot is kept.
    Disconnected,
    /// Torn down by the owner.
    Closed,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Live)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Live => "live",
            ConnectionStatus::Silent => "silent",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        assert!(SubscriptionParams::new("dev", 2, 1).validate().is_ok());
        assert!(SubscriptionParams::new(" ", 4, 5).validate().is_err());
        assert!(SubscriptionParams::new("dev", 1, 5).validate().is_err());
        let err = SubscriptionParams::new("dev", 4, 0).validate().unwrap_err();
        assert!(matches!(err, VizError::InvalidParameters { .. }));
    }

    #[test]
    fn test_params_accept_producer_names() {
        let p: SubscriptionParams =
            serde_json::from_str(r#"{"sessionId": "s1", "numClusters": 5, "intervalSeconds": 3}"#).unwrap();
        assert_eq!(p, SubscriptionParams::new("s1", 5, 3));
    }

    #[test]
    fn test_only_live_is_connected() {
        assert!(ConnectionStatus::Live.is_connected());
        assert!(!ConnectionStatus::Silent.is_connected());
        assert!(!ConnectionStatus::Disconnected.is_connected());
    }
}
