//! Numeric and timing primitives shared by every engine crate. Nothing in
//! here knows about tiles, views or renderers.

pub mod bounds;
pub mod ids;
pub mod math;
pub mod rect;
pub mod time;
pub mod util;

pub use bounds::*;
pub use ids::*;
pub use rect::*;
pub use time::*;
