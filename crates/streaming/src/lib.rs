//! Tile content: asset loading, textures and their residency.

pub mod asset;
pub mod cache;
pub mod load;
pub mod residency;
pub mod store;
pub mod synthetic;
pub mod texture;

pub use asset::*;
pub use cache::*;
pub use load::*;
pub use residency::ResidencyState;
pub use store::*;
pub use synthetic::*;
pub use texture::*;
