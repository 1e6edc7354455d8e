//! Map rendering.
//!
//! ```text
//! ┌──────────────┐   Frame    ┌──────────────────────┐   draw calls   ┌─────────────┐
//! │ ClusterUpdate├───────────▶│ RenderSurfaceManager ├───────────────▶│ dyn Surface │
//! │ QualityConfig│            │  bounds + projection │                │  SvgSurface │
//! │ KpiPanels    │            │  layer ordering      │                │  DisplayList│
//! └──────────────┘            └──────────┬───────────┘                └─────────────┘
//!                                        │ ProjectionContext
//!                                        ▼
//!                                 interaction::hit_test
//! ```
//!
//! A frame is always a complete redraw of the latest snapshot.

pub mod display_list;
pub mod manager;
pub mod panels;
pub mod style;
pub mod surface;
pub mod svg;

pub use display_list::{DisplayList, DrawCommand};
pub use manager::{Frame, RenderReport, RenderState, RenderSurfaceManager};
pub use panels::draw_kpi_panels;
pub use style::{RenderStyle, TierFilter};
pub use surface::{Fill, Layer, Stroke, Surface, TextAnchor, TextStyle};
pub use svg::SvgSurface;
