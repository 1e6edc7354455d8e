//! Pointer interaction: resolving clicks to zones and tracking the selection.
//!
//! Nothing here touches the network or the render loop. Both pieces work on
//! the latest snapshot and the projection of the last rendered frame.

pub mod hit_test;
pub mod selection;

pub use hit_test::hit_test;
pub use selection::Selection;
