use std::collections::BTreeMap;

use geometry::GeometryKind;
use view::ViewKind;

use crate::renderer::Renderer;

pub type RendererFactory = Box<dyn Fn() -> Box<dyn Renderer>>;

/// Renderer implementations keyed by the geometry/view pairing they draw.
#[derive(Default)]
pub struct RendererRegistry {
    factories: BTreeMap<(GeometryKind, ViewKind), RendererFactory>,
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a factory to a pairing, replacing any earlier one. Returns
    /// whether a factory was replaced.
    pub fn register<F>(&mut self, geometry: GeometryKind, view: ViewKind, factory: F) -> bool
    where
        F: Fn() -> Box<dyn Renderer> + 'static,
    {
        tracing::debug!(%geometry, %view, "registered renderer");
        self.factories
            .insert((geometry, view), Box::new(factory))
            .is_some()
    }

    pub fn contains(&self, geometry: GeometryKind, view: ViewKind) -> bool {
        self.factories.contains_key(&(geometry, view))
    }

    pub fn create(&self, geometry: GeometryKind, view: ViewKind) -> Option<Box<dyn Renderer>> {
        self.factories.get(&(geometry, view)).map(|make| make())
    }

    pub fn pairings(&self) -> impl Iterator<Item = (GeometryKind, ViewKind)> + '_ {
        self.factories.keys().copied()
    }
}
