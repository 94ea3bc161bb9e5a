//! Layer composition and the per-frame render loop.
//!
//! A [`Stage`] owns an ordered stack of [`Layer`]s, each pairing a geometry
//! with a view and a texture store, and drives the renderer registered for
//! each pairing. A [`Viewer`] adds input controls and animated transitions
//! on top.

pub mod config;
pub mod error;
pub mod layer;
pub mod stage;
pub mod viewer;

pub use config::StageConfig;
pub use error::StageError;
pub use layer::{Layer, LayerOptions};
pub use stage::{FrameReport, LayerReport, Stage, StageEvent};
pub use viewer::{DEFAULT_KEY_FRICTION, DEFAULT_KEY_VELOCITY, ViewTarget, Viewer};
