//! Data model shared by the stream client, renderer and interaction layer.

pub mod cluster;
pub mod kpi;
pub mod macros;

pub use cluster::{ClusterId, ClusterUpdate, ClusterZone, GeoPoint};
pub use kpi::{ElbowResult, KpiPanels, SilhouetteResult};
