//! The renderer frame protocol and the registry that pairs renderers with
//! geometry/view kinds.

pub mod effects;
pub mod recording;
pub mod registry;
pub mod renderer;

pub use effects::*;
pub use recording::*;
pub use registry::*;
pub use renderer::*;
