use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use geometry::Geometry;
use render::{Effects, LayerId};
use serde::{Deserialize, Serialize};
use streaming::TextureStore;
use view::View;

use crate::error::StageError;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerOptions {
    pub effects: Effects,
    /// Always draw this level instead of selecting one from the view.
    pub fixed_level: Option<u32>,
    pub pin_first_level: bool,
}

/// A geometry seen through a view, with the store that holds its textures.
pub struct Layer {
    id: LayerId,
    geometry: Geometry,
    view: View,
    store: TextureStore,
    effects: Effects,
    fixed_level: Option<u32>,
    pinned_levels: BTreeSet<u32>,
    dirty: Rc<Cell<bool>>,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("geometry", &self.geometry.kind())
            .field("view", &self.view.kind())
            .field("fixed_level", &self.fixed_level)
            .field("pinned_levels", &self.pinned_levels)
            .finish_non_exhaustive()
    }
}

impl Layer {
    pub fn new(
        geometry: Geometry,
        mut view: View,
        store: TextureStore,
        options: LayerOptions,
    ) -> Result<Self, StageError> {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        // The view lives exactly as long as the layer, so the subscription
        // never needs to be removed.
        view.subscribe(move |_| flag.set(true));

        let mut layer = Self {
            id: LayerId::next(),
            geometry,
            view,
            store,
            effects: options.effects,
            fixed_level: None,
            pinned_levels: BTreeSet::new(),
            dirty,
        };
        layer.set_fixed_level(options.fixed_level)?;
        if options.pin_first_level {
            layer.pin_first_level();
        }
        Ok(layer)
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Parameter changes made through this reference invalidate the stage
    /// via the view's change events.
    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn store(&self) -> &TextureStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TextureStore {
        &mut self.store
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn set_effects(&mut self, effects: Effects) {
        self.effects = effects;
        self.dirty.set(true);
    }

    pub fn fixed_level(&self) -> Option<u32> {
        self.fixed_level
    }

    pub fn set_fixed_level(&mut self, level: Option<u32>) -> Result<(), StageError> {
        if let Some(z) = level {
            self.check_level(z)?;
        }
        self.fixed_level = level;
        self.dirty.set(true);
        Ok(())
    }

    /// Keeps every tile of level `z` loaded regardless of visibility.
    /// Returns the number of tiles pinned. Pinning a level twice is a no-op.
    pub fn pin_level(&mut self, z: u32) -> Result<usize, StageError> {
        self.check_level(z)?;
        if !self.pinned_levels.insert(z) {
            return Ok(0);
        }
        let tiles = self.geometry.level_tiles(z);
        for tile in &tiles {
            self.store.pin(*tile);
        }
        tracing::debug!(layer = %self.id, level = z, tiles = tiles.len(), "pinned level");
        self.dirty.set(true);
        Ok(tiles.len())
    }

    pub fn unpin_level(&mut self, z: u32) -> Result<usize, StageError> {
        self.check_level(z)?;
        if !self.pinned_levels.remove(&z) {
            return Ok(0);
        }
        let tiles = self.geometry.level_tiles(z);
        for tile in &tiles {
            self.store.unpin(*tile);
        }
        tracing::debug!(layer = %self.id, level = z, tiles = tiles.len(), "unpinned level");
        Ok(tiles.len())
    }

    /// Pins the coarsest level, so something can always be drawn.
    pub fn pin_first_level(&mut self) -> usize {
        self.pin_level(0).unwrap_or(0)
    }

    pub fn pinned_levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.pinned_levels.iter().copied()
    }

    /// Split borrow for drawing a frame.
    pub(crate) fn frame_parts(&mut self) -> (&Geometry, &View, &Effects, &mut TextureStore) {
        (&self.geometry, &self.view, &self.effects, &mut self.store)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    fn check_level(&self, z: u32) -> Result<(), StageError> {
        if self.geometry.level(z).is_none() {
            return Err(StageError::InvalidLevel {
                level: z,
                max: self.geometry.max_level(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Layer, LayerOptions};
    use crate::error::StageError;
    use geometry::{FlatGeometry, FlatLevelDesc, Geometry};
    use pretty_assertions::assert_eq;
    use streaming::{MemoryTextureFactory, SyntheticSource, TextureStore, TextureStoreConfig};
    use view::{FlatView, View};

    fn layer(options: LayerOptions) -> Result<Layer, StageError> {
        let geometry = Geometry::Flat(
            FlatGeometry::new(&[
                FlatLevelDesc {
                    width: 256,
                    height: 256,
                    tile_width: 256,
                    tile_height: 256,
                    fallback_only: false,
                },
                FlatLevelDesc {
                    width: 512,
                    height: 512,
                    tile_width: 256,
                    tile_height: 256,
                    fallback_only: false,
                },
            ])
            .unwrap(),
        );
        let store = TextureStore::new(
            Box::new(SyntheticSource::new(256, 256, 1)),
            Box::new(MemoryTextureFactory::new()),
            TextureStoreConfig::default(),
        );
        Layer::new(geometry, View::from(FlatView::default()), store, options)
    }

    #[test]
    fn pinning_a_level_pins_all_its_tiles() {
        let mut layer = layer(LayerOptions::default()).unwrap();
        assert_eq!(layer.pin_level(1), Ok(4));
        assert_eq!(layer.pin_level(1), Ok(0));
        let tiles = layer.geometry().level_tiles(1);
        assert!(tiles.iter().all(|t| layer.store().query(t).pin_count == 1));

        assert_eq!(layer.unpin_level(1), Ok(4));
        assert!(tiles.iter().all(|t| !layer.store().query(t).pinned));
        assert_eq!(layer.pinned_levels().count(), 0);
    }

    #[test]
    fn options_are_applied_on_creation() {
        let layer = layer(LayerOptions {
            fixed_level: Some(1),
            pin_first_level: true,
            ..LayerOptions::default()
        })
        .unwrap();
        assert_eq!(layer.fixed_level(), Some(1));
        assert_eq!(layer.pinned_levels().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn unknown_levels_are_rejected() {
        let err = layer(LayerOptions {
            fixed_level: Some(5),
            ..LayerOptions::default()
        })
        .unwrap_err();
        assert_eq!(err, StageError::InvalidLevel { level: 5, max: 1 });
    }

    #[test]
    fn view_changes_mark_the_layer_dirty() {
        let mut layer = layer(LayerOptions::default()).unwrap();
        layer.clear_dirty();
        layer.view_mut().as_flat_mut().unwrap().set_size(100.0, 100.0);
        assert!(layer.is_dirty());
    }
}
