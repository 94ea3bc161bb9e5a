use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use foundation::Time;
use geometry::{Geometry, GeometryKind, Tile};
use render::{GuardedRenderer, LayerContext, LayerId, Renderer, RendererRegistry};
use runtime::{EventBus, Tagged};
use serde::Serialize;
use streaming::{Source, StoreEvent, TextureFactory, TextureStore};
use view::{View, ViewKind};

use crate::config::StageConfig;
use crate::error::StageError;
use crate::layer::{Layer, LayerOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    RenderStart,
    RenderComplete { stable: bool },
    /// Something changed and the next frame will look different.
    RenderInvalid,
    Store { layer: LayerId, event: StoreEvent },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerReport {
    pub layer: LayerId,
    pub level: Option<u32>,
    pub visible: Vec<Tile>,
    pub rendered: Vec<Tile>,
    /// Visible tiles that had no texture this frame.
    pub missing: usize,
    /// Rendered tiles drawn in place of missing ones.
    pub fallbacks: usize,
    pub loading: usize,
    pub queued: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub time: f64,
    /// Every visible tile of every layer was drawn at its own level.
    pub stable: bool,
    pub layers: Vec<LayerReport>,
}

/// Composites an ordered stack of layers, bottom first.
pub struct Stage {
    config: StageConfig,
    width: f64,
    height: f64,
    layers: Vec<Layer>,
    registry: RendererRegistry,
    renderers: BTreeMap<(GeometryKind, ViewKind), GuardedRenderer>,
    events: EventBus<StageEvent>,
    invalid: bool,
    frame: u64,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("size", &(self.width, self.height))
            .field("layers", &self.layers)
            .field("registry", &self.registry)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}

impl Stage {
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            width: 0.0,
            height: 0.0,
            layers: Vec::new(),
            registry: RendererRegistry::new(),
            renderers: BTreeMap::new(),
            events: EventBus::new(),
            invalid: true,
            frame: 0,
        }
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn register_renderer<F>(&mut self, geometry: GeometryKind, view: ViewKind, factory: F)
    where
        F: Fn() -> Box<dyn Renderer> + 'static,
    {
        self.registry.register(geometry, view, factory);
        // The next frame builds an instance from the new factory.
        self.renderers.remove(&(geometry, view));
        self.invalidate();
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), StageError> {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(StageError::InvalidSize { width, height });
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.invalidate();
        }
        Ok(())
    }

    /// Builds a layer with its own texture store and adds it on top.
    pub fn create_layer(
        &mut self,
        geometry: Geometry,
        view: View,
        source: Box<dyn Source>,
        factory: Box<dyn TextureFactory>,
        options: LayerOptions,
    ) -> Result<LayerId, StageError> {
        self.check_pairing(&geometry, &view)?;
        let store = TextureStore::new(source, factory, self.config.store_config());
        let layer = Layer::new(geometry, view, store, options)?;
        self.add_layer(layer, None)
    }

    /// Inserts `layer` at `index` (top when `None`). Fails before anything
    /// is rendered when no renderer can draw the layer.
    pub fn add_layer(&mut self, layer: Layer, index: Option<usize>) -> Result<LayerId, StageError> {
        self.check_pairing(layer.geometry(), layer.view())?;
        let len = self.layers.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(StageError::InvalidIndex { index, len });
        }
        let id = layer.id();
        tracing::debug!(
            layer = %id,
            geometry = %layer.geometry().kind(),
            view = %layer.view().kind(),
            index,
            "added layer"
        );
        self.layers.insert(index, layer);
        self.invalidate();
        Ok(id)
    }

    pub fn move_layer(&mut self, id: LayerId, index: usize) -> Result<(), StageError> {
        let from = self.position(id)?;
        let len = self.layers.len();
        if index >= len {
            return Err(StageError::InvalidIndex { index, len });
        }
        let layer = self.layers.remove(from);
        self.layers.insert(index, layer);
        self.invalidate();
        Ok(())
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, StageError> {
        let index = self.position(id)?;
        let layer = self.layers.remove(index);
        tracing::debug!(layer = %id, "removed layer");
        self.invalidate();
        Ok(layer)
    }

    pub fn has_layer(&self, id: LayerId) -> bool {
        self.layers.iter().any(|l| l.id() == id)
    }

    /// Bottom to top.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn layers_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(Layer::id).collect()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Whether the next `render` would differ from the last one.
    pub fn is_invalid(&self) -> bool {
        self.invalid || self.layers.iter().any(Layer::is_dirty)
    }

    pub fn invalidate(&mut self) {
        if !self.invalid {
            self.invalid = true;
            self.events.emit(StageEvent::RenderInvalid);
        }
    }

    pub fn drain_events(&mut self) -> Vec<Tagged<StageEvent>> {
        self.events.drain()
    }

    /// Draws one frame.
    ///
    /// Each layer picks a level, marks the visible tiles in its store and
    /// hands the drawable ones to the renderer for its pairing in ascending
    /// tile order.
    ///
    /// # Panics
    /// When a renderer is left with an open layer.
    pub fn render(&mut self, now: Time) -> FrameReport {
        self.events.set_tick(self.frame);
        self.events.emit(StageEvent::RenderStart);

        let stage_size = (self.width, self.height);
        let mut reports = Vec::with_capacity(self.layers.len());
        for (layer_z, layer) in self.layers.iter_mut().enumerate() {
            let key = (layer.geometry().kind(), layer.view().kind());
            let renderer = match self.renderers.entry(key) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => match self.registry.create(key.0, key.1) {
                    Some(r) => e.insert(GuardedRenderer::new(r)),
                    None => {
                        tracing::warn!(
                            layer = %layer.id(),
                            geometry = %key.0,
                            view = %key.1,
                            "no renderer"
                        );
                        continue;
                    }
                },
            };
            let report = render_layer(layer, layer_z, renderer, stage_size, &self.config, now);
            let id = layer.id();
            for event in layer.store_mut().drain_events() {
                self.events.emit(StageEvent::Store { layer: id, event });
            }
            layer.clear_dirty();
            reports.push(report);
        }
        for renderer in self.renderers.values() {
            renderer.guard().assert_idle();
        }

        let stable = reports.iter().all(|r| r.missing == 0);
        self.events.emit(StageEvent::RenderComplete { stable });
        tracing::trace!(frame = self.frame, layers = reports.len(), stable, "rendered frame");

        let report = FrameReport {
            frame: self.frame,
            time: now.seconds(),
            stable,
            layers: reports,
        };
        self.frame += 1;
        self.invalid = false;
        if !stable {
            self.invalidate();
        }
        report
    }

    fn check_pairing(&self, geometry: &Geometry, view: &View) -> Result<(), StageError> {
        let (g, v) = (geometry.kind(), view.kind());
        if geometry.view_kind() != v {
            return Err(StageError::ViewMismatch { geometry: g, view: v });
        }
        if !self.registry.contains(g, v) {
            return Err(StageError::NoRenderer { geometry: g, view: v });
        }
        Ok(())
    }

    fn position(&self, id: LayerId) -> Result<usize, StageError> {
        self.layers
            .iter()
            .position(|l| l.id() == id)
            .ok_or(StageError::UnknownLayer(id))
    }
}

fn render_layer(
    layer: &mut Layer,
    layer_z: usize,
    renderer: &mut GuardedRenderer,
    (stage_width, stage_height): (f64, f64),
    config: &StageConfig,
    now: Time,
) -> LayerReport {
    let id = layer.id();
    let (width, height) = layer.effects().pixel_size(stage_width, stage_height);
    let rect = layer.effects().normalized_rect(stage_width, stage_height);
    layer.view_mut().set_size(width, height);
    let fixed_level = layer.fixed_level();

    let (geometry, view, effects, store) = layer.frame_parts();
    let level = if width > 0.0 && height > 0.0 {
        fixed_level.or_else(|| geometry.select_level(view, config.pixel_ratio))
    } else {
        None
    };
    let visible = level
        .map(|z| geometry.visible_tiles(view, z))
        .unwrap_or_default();

    store.start_frame(now);
    for tile in &visible {
        store.mark_tile(*tile);
        if config.progressive {
            let mut up = geometry.parent(tile);
            while let Some(parent) = up {
                store.mark_tile(parent);
                up = geometry.parent(&parent);
            }
        }
    }
    store.end_frame();

    let mut draw = BTreeSet::new();
    let mut missing = 0;
    for tile in &visible {
        if store.has_texture(tile) {
            draw.insert(*tile);
        } else {
            missing += 1;
            draw.extend(fallback_for(geometry, store, tile));
        }
    }

    let ctx = LayerContext { id, view, effects };
    renderer.start_layer(&ctx, &rect);
    for tile in &draw {
        if let Some(texture) = store.texture(tile) {
            renderer.render_tile(tile, texture, &ctx, layer_z);
        }
    }
    renderer.end_layer(&ctx, &rect);

    let shown: BTreeSet<&Tile> = visible.iter().collect();
    let fallbacks = draw.iter().filter(|t| !shown.contains(t)).count();
    tracing::trace!(
        layer = %id,
        level = ?level,
        visible = visible.len(),
        rendered = draw.len(),
        missing,
        "rendered layer"
    );
    LayerReport {
        layer: id,
        level,
        visible,
        rendered: draw.into_iter().collect(),
        missing,
        fallbacks,
        loading: store.loading_count(),
        queued: store.queued_count(),
    }
}

/// The nearest loaded ancestor of `tile`, or failing that its loaded
/// children.
fn fallback_for(geometry: &Geometry, store: &TextureStore, tile: &Tile) -> Vec<Tile> {
    let mut up = geometry.parent(tile);
    while let Some(parent) = up {
        if store.has_texture(&parent) {
            return vec![parent];
        }
        up = geometry.parent(&parent);
    }
    geometry
        .children(tile)
        .into_iter()
        .filter(|c| store.has_texture(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Stage, StageEvent};
    use crate::config::StageConfig;
    use crate::error::StageError;
    use crate::layer::LayerOptions;
    use geometry::{FlatGeometry, FlatLevelDesc, Geometry, GeometryKind};
    use pretty_assertions::assert_eq;
    use render::{RecordingRenderer, RenderLog};
    use streaming::{MemoryTextureFactory, SyntheticSource};
    use view::{FlatView, View, ViewKind};

    fn geometry() -> Geometry {
        Geometry::Flat(
            FlatGeometry::new(&[FlatLevelDesc {
                width: 512,
                height: 512,
                tile_width: 256,
                tile_height: 256,
                fallback_only: false,
            }])
            .unwrap(),
        )
    }

    fn stage() -> Stage {
        let mut stage = Stage::new(StageConfig::default());
        let log = RenderLog::default();
        stage.register_renderer(GeometryKind::Flat, ViewKind::Flat, move || {
            Box::new(RecordingRenderer::new(log.clone()))
        });
        stage
    }

    fn add(stage: &mut Stage) -> render::LayerId {
        stage
            .create_layer(
                geometry(),
                View::from(FlatView::default()),
                Box::new(SyntheticSource::new(256, 256, 0)),
                Box::new(MemoryTextureFactory::new()),
                LayerOptions::default(),
            )
            .unwrap()
    }

    #[test]
    fn layer_order_can_be_changed() {
        let mut stage = stage();
        let a = add(&mut stage);
        let b = add(&mut stage);
        assert_eq!(stage.layer_ids(), vec![a, b]);
        stage.move_layer(b, 0).unwrap();
        assert_eq!(stage.layer_ids(), vec![b, a]);
        assert_eq!(stage.move_layer(a, 2), Err(StageError::InvalidIndex { index: 2, len: 2 }));

        let removed = stage.remove_layer(b).unwrap();
        assert_eq!(removed.id(), b);
        assert!(!stage.has_layer(b));
        assert_eq!(stage.remove_layer(b).unwrap_err(), StageError::UnknownLayer(b));
    }

    #[test]
    fn mismatched_view_is_rejected() {
        let mut stage = stage();
        let err = stage
            .create_layer(
                geometry(),
                View::from(view::RectilinearView::default()),
                Box::new(SyntheticSource::new(256, 256, 0)),
                Box::new(MemoryTextureFactory::new()),
                LayerOptions::default(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            StageError::ViewMismatch {
                geometry: GeometryKind::Flat,
                view: ViewKind::Rectilinear
            }
        );
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let mut stage = stage();
        assert!(stage.set_size(f64::NAN, 10.0).is_err());
        assert!(stage.set_size(-1.0, 10.0).is_err());
        assert!(stage.set_size(0.0, 0.0).is_ok());
    }

    #[test]
    fn stable_frame_clears_the_invalid_flag() {
        let mut stage = stage();
        add(&mut stage);
        stage.set_size(512.0, 512.0).unwrap();
        assert!(stage.is_invalid());

        let report = stage.render(foundation::Time::ZERO);
        assert!(report.stable);
        assert!(!stage.is_invalid());

        let events: Vec<StageEvent> = stage.drain_events().into_iter().map(|t| t.event).collect();
        assert_eq!(events.first(), Some(&StageEvent::RenderStart));
        assert_eq!(events.last(), Some(&StageEvent::RenderComplete { stable: true }));
    }
}
