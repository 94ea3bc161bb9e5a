use std::collections::BTreeMap;

use foundation::{Rect, RectKey, next_serial};
use geometry::Tile;
use serde::Serialize;
use streaming::Texture;
use view::View;

use crate::effects::Effects;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LayerId(u64);

impl LayerId {
    pub fn next() -> Self {
        LayerId(next_serial())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// What a renderer may know about the layer it is drawing.
#[derive(Debug, Copy, Clone)]
pub struct LayerContext<'a> {
    pub id: LayerId,
    pub view: &'a View,
    pub effects: &'a Effects,
}

/// Composites the tiles of one geometry/view pairing.
///
/// Per `(layer, rect)` the calls form `start_layer`, any number of
/// `render_tile` in ascending tile order, then one `end_layer`.
pub trait Renderer {
    fn start_layer(&mut self, layer: &LayerContext<'_>, rect: &Rect);

    /// `layer_z` is the layer's position on the stage, bottom first.
    fn render_tile(
        &mut self,
        tile: &Tile,
        texture: &dyn Texture,
        layer: &LayerContext<'_>,
        layer_z: usize,
    );

    fn end_layer(&mut self, layer: &LayerContext<'_>, rect: &Rect);
}

#[derive(Debug)]
struct OpenLayer {
    opened: u64,
    last_tile: Option<Tile>,
}

/// Enforces the renderer call protocol. Any violation is a caller bug and
/// panics.
///
/// Tiles are attributed to the most recently opened rect of their layer.
#[derive(Debug, Default)]
pub struct ProtocolGuard {
    open: BTreeMap<(LayerId, RectKey), OpenLayer>,
    opened: u64,
}

impl ProtocolGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_layer(&mut self, layer: LayerId, rect: &Rect) {
        let key = (layer, rect.key());
        if self.open.contains_key(&key) {
            panic!("start_layer({layer}, {rect:?}) while the same layer and rect are still open");
        }
        self.opened += 1;
        self.open.insert(
            key,
            OpenLayer {
                opened: self.opened,
                last_tile: None,
            },
        );
    }

    pub fn render_tile(&mut self, layer: LayerId, tile: &Tile) {
        let Some(open) = self
            .open
            .iter_mut()
            .filter(|((id, _), _)| *id == layer)
            .map(|(_, open)| open)
            .max_by_key(|open| open.opened)
        else {
            panic!("render_tile({tile}) outside an open layer ({layer})");
        };
        if let Some(last) = open.last_tile
            && last >= *tile
        {
            panic!("render_tile({tile}) out of order in {layer}: follows {last}");
        }
        open.last_tile = Some(*tile);
    }

    pub fn end_layer(&mut self, layer: LayerId, rect: &Rect) {
        if self.open.remove(&(layer, rect.key())).is_none() {
            panic!("end_layer({layer}, {rect:?}) without a matching start_layer");
        }
    }

    pub fn is_idle(&self) -> bool {
        self.open.is_empty()
    }

    /// Panics if a layer was left open.
    pub fn assert_idle(&self) {
        if let Some((layer, _)) = self.open.keys().next() {
            panic!("frame ended with {layer} still open");
        }
    }
}

/// Wraps a renderer so that every call is checked by a [`ProtocolGuard`]
/// before it is forwarded.
pub struct GuardedRenderer {
    inner: Box<dyn Renderer>,
    guard: ProtocolGuard,
}

impl GuardedRenderer {
    pub fn new(inner: Box<dyn Renderer>) -> Self {
        Self {
            inner,
            guard: ProtocolGuard::new(),
        }
    }

    pub fn guard(&self) -> &ProtocolGuard {
        &self.guard
    }
}

impl std::fmt::Debug for GuardedRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedRenderer")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl Renderer for GuardedRenderer {
    fn start_layer(&mut self, layer: &LayerContext<'_>, rect: &Rect) {
        self.guard.start_layer(layer.id, rect);
        self.inner.start_layer(layer, rect);
    }

    fn render_tile(
        &mut self,
        tile: &Tile,
        texture: &dyn Texture,
        layer: &LayerContext<'_>,
        layer_z: usize,
    ) {
        self.guard.render_tile(layer.id, tile);
        self.inner.render_tile(tile, texture, layer, layer_z);
    }

    fn end_layer(&mut self, layer: &LayerContext<'_>, rect: &Rect) {
        self.guard.end_layer(layer.id, rect);
        self.inner.end_layer(layer, rect);
    }
}
