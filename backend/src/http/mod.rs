//! HTTP server module.
//!
//! Exposes cluster map views over a small REST API: create a view, feed it
//! from a producer subscription, render it as SVG, click, switch schemes and
//! export.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and validation                         │
//! │  - SVG / CSV / GeoJSON / SSE responses                    │
//! │  - CORS, compression, error handling                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  ViewRegistry -> ClusterView                              │
//! │  - render manager, selection, scheme, KPI panels          │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  StreamClient -> ClusterTransport                         │
//! │  - SSE producer / in-memory channel                       │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
