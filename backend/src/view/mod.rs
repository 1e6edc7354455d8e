//! View sessions.
//!
//! A [`ClusterView`] is one map: its own stream subscription, render state,
//! selection and color scheme. It is opened and closed explicitly and tears
//! its subscription down when dropped. [`ViewRegistry`] tracks live views by
//! id for the HTTP layer.

pub mod registry;
pub mod session;

pub use registry::{ViewInfo, ViewRegistry};
pub use session::{ClusterView, ViewStatus};
