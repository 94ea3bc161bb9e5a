use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

/// Drawable content for one tile, produced by a [`Source`](crate::Source).
///
/// The store calls [`Asset::destroy`] exactly once when it lets go of the
/// asset and never touches it afterwards.
pub trait Asset {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Non-decreasing version stamp. A change tells the store to refresh
    /// the texture built from this asset.
    fn timestamp(&self) -> u64 {
        0
    }

    /// Dynamic assets may change after loading; static ones never do.
    fn is_dynamic(&self) -> bool {
        false
    }

    /// Opaque drawable handle for texture factories to downcast.
    fn element(&self) -> &dyn Any;

    fn destroy(&mut self);
}

/// Immutable asset wrapping an arbitrary element.
pub struct StaticAsset {
    width: u32,
    height: u32,
    element: Box<dyn Any>,
    destroyed: bool,
}

impl StaticAsset {
    pub fn new(width: u32, height: u32, element: impl Any) -> Self {
        Self {
            width,
            height,
            element: Box::new(element),
            destroyed: false,
        }
    }

    /// An asset with no element, for sources that only describe sizes.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, ())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl std::fmt::Debug for StaticAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Asset for StaticAsset {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn element(&self) -> &dyn Any {
        self.element.as_ref()
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

/// Application-side handle that bumps a [`DynamicAsset`]'s timestamp,
/// e.g. when a video frame or canvas was redrawn.
#[derive(Debug, Clone, Default)]
pub struct AssetChanges {
    stamp: Rc<Cell<u64>>,
}

impl AssetChanges {
    pub fn mark_changed(&self) {
        self.stamp.set(self.stamp.get() + 1);
    }

    pub fn timestamp(&self) -> u64 {
        self.stamp.get()
    }
}

/// Asset whose content changes over time.
pub struct DynamicAsset {
    inner: StaticAsset,
    stamp: Rc<Cell<u64>>,
}

impl DynamicAsset {
    pub fn new(width: u32, height: u32, element: impl Any) -> (Self, AssetChanges) {
        let changes = AssetChanges::default();
        let asset = Self {
            inner: StaticAsset::new(width, height, element),
            stamp: Rc::clone(&changes.stamp),
        };
        (asset, changes)
    }
}

impl std::fmt::Debug for DynamicAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicAsset")
            .field("inner", &self.inner)
            .field("timestamp", &self.stamp.get())
            .finish()
    }
}

impl Asset for DynamicAsset {
    fn width(&self) -> u32 {
        self.inner.width
    }

    fn height(&self) -> u32 {
        self.inner.height
    }

    fn timestamp(&self) -> u64 {
        self.stamp.get()
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn element(&self) -> &dyn Any {
        self.inner.element()
    }

    fn destroy(&mut self) {
        self.inner.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::{Asset, DynamicAsset, StaticAsset};

    #[test]
    fn element_downcasts() {
        let asset = StaticAsset::new(4, 2, String::from("pixels"));
        assert_eq!(asset.element().downcast_ref::<String>().map(String::as_str), Some("pixels"));
        assert!(!asset.is_dynamic());
    }

    #[test]
    fn dynamic_timestamp_follows_changes() {
        let (asset, changes) = DynamicAsset::new(1, 1, ());
        assert_eq!(asset.timestamp(), 0);
        changes.mark_changed();
        changes.mark_changed();
        assert_eq!(asset.timestamp(), 2);
        assert!(asset.is_dynamic());
    }
}
