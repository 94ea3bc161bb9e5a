//! Headless driver for panorama stages: JSON scene descriptions and a
//! frame-stepped simulation used by the `pano` binary.

pub mod scene;
pub mod simulate;

pub use scene::{Action, ConfigError, Scene, ScriptStep, SourceDesc};
pub use simulate::{FrameLine, Simulation};
