//! # Cellzone
//!
//! Real-time visualizer for clustered cellular signal-quality measurements.
//!
//! A producer periodically re-clusters GPS-tagged radio measurements (RSRP,
//! RSRQ, SINR) and pushes complete snapshots of the resulting zones. This
//! crate subscribes to that stream, keeps the newest valid snapshot, and
//! draws it as a 2-D map: one convex hull per zone colored by quality tier,
//! centroid markers, raw points, an info overlay and a legend.
//!
//! ## Architecture
//!
//! - [`geometry`]: bounds, convex hull, linear projection, point-in-polygon
//! - [`quality`]: tier ladders and color schemes, one shared versioned config
//! - [`models`]: snapshot, zone and point types; one-shot KPI results
//! - [`stream`]: push-channel transports and the subscription client
//! - [`render`]: render surface manager and drawing backends (SVG, display list)
//! - [`interaction`]: hit testing and zone selection
//! - [`view`]: view sessions with explicit open/close, and their registry
//! - [`export`]: CSV and GeoJSON exports of a snapshot
//! - [`kpi`]: elbow and silhouette collaborators
//! - [`config`]: TOML file plus environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! Snapshots replace each other wholesale. Nothing drawn for one snapshot
//! survives into the next frame.

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod interaction;
pub mod kpi;
pub mod models;
pub mod quality;
pub mod render;
pub mod stream;
pub mod view;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ErrorContext, VizError, VizResult};
