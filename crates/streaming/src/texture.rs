use std::cell::Cell;
use std::rc::Rc;

use geometry::Tile;

use crate::asset::Asset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// The asset has a zero dimension.
    EmptyAsset { width: u32, height: u32 },
    /// The asset's element is of a type the factory cannot upload.
    UnsupportedElement,
    Upload { message: String },
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureError::EmptyAsset { width, height } => {
                write!(f, "cannot build a texture from a {width}x{height} asset")
            }
            TextureError::UnsupportedElement => write!(f, "unsupported asset element"),
            TextureError::Upload { message } => write!(f, "texture upload failed: {message}"),
        }
    }
}

impl std::error::Error for TextureError {}

/// Renderer-side copy of an asset.
pub trait Texture {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Re-uploads from an asset whose timestamp changed.
    fn refresh(&mut self, tile: &Tile, asset: &dyn Asset) -> Result<(), TextureError>;

    fn destroy(&mut self);
}

pub trait TextureFactory {
    fn create_texture(
        &mut self,
        tile: &Tile,
        asset: &dyn Asset,
    ) -> Result<Box<dyn Texture>, TextureError>;
}

/// Shared counters for [`MemoryTexture`]s, handy for reports and tests.
#[derive(Debug, Clone, Default)]
pub struct TextureStats {
    created: Rc<Cell<u64>>,
    refreshed: Rc<Cell<u64>>,
    destroyed: Rc<Cell<u64>>,
}

impl TextureStats {
    pub fn created(&self) -> u64 {
        self.created.get()
    }

    pub fn refreshed(&self) -> u64 {
        self.refreshed.get()
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed.get()
    }

    pub fn live(&self) -> u64 {
        self.created().saturating_sub(self.destroyed())
    }

    fn bump(cell: &Cell<u64>) {
        cell.set(cell.get() + 1);
    }
}

/// A texture that only remembers what it was built from.
#[derive(Debug)]
pub struct MemoryTexture {
    width: u32,
    height: u32,
    timestamp: u64,
    stats: TextureStats,
}

impl MemoryTexture {
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Texture for MemoryTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn refresh(&mut self, _tile: &Tile, asset: &dyn Asset) -> Result<(), TextureError> {
        self.width = asset.width();
        self.height = asset.height();
        self.timestamp = asset.timestamp();
        TextureStats::bump(&self.stats.refreshed);
        Ok(())
    }

    fn destroy(&mut self) {
        TextureStats::bump(&self.stats.destroyed);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTextureFactory {
    stats: TextureStats,
}

impl MemoryTextureFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> TextureStats {
        self.stats.clone()
    }
}

impl TextureFactory for MemoryTextureFactory {
    fn create_texture(
        &mut self,
        _tile: &Tile,
        asset: &dyn Asset,
    ) -> Result<Box<dyn Texture>, TextureError> {
        let (width, height) = (asset.width(), asset.height());
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyAsset { width, height });
        }
        TextureStats::bump(&self.stats.created);
        Ok(Box::new(MemoryTexture {
            width,
            height,
            timestamp: asset.timestamp(),
            stats: self.stats.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryTextureFactory, TextureError, TextureFactory};
    use crate::asset::StaticAsset;
    use geometry::{GeometryId, Tile};

    #[test]
    fn empty_assets_are_rejected() {
        let tile = Tile::grid(GeometryId::next(), 0, 0, 0);
        let mut factory = MemoryTextureFactory::new();
        let err = factory
            .create_texture(&tile, &StaticAsset::blank(0, 4))
            .err();
        assert_eq!(err, Some(TextureError::EmptyAsset { width: 0, height: 4 }));

        let mut tex = factory
            .create_texture(&tile, &StaticAsset::blank(8, 4))
            .unwrap();
        assert_eq!((tex.width(), tex.height()), (8, 4));
        tex.destroy();
        let stats = factory.stats();
        assert_eq!((stats.created(), stats.destroyed(), stats.live()), (1, 1, 0));
    }
}
