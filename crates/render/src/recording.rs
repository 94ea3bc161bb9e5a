use std::cell::RefCell;
use std::rc::Rc;

use foundation::Rect;
use geometry::Tile;
use serde::Serialize;
use streaming::Texture;

use crate::renderer::{LayerContext, LayerId, Renderer};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    StartLayer {
        layer: LayerId,
        rect: Rect,
    },
    RenderTile {
        layer: LayerId,
        tile: Tile,
        layer_z: usize,
        texture_width: u32,
        texture_height: u32,
    },
    EndLayer {
        layer: LayerId,
        rect: Rect,
    },
}

/// Shared, append-only list of commands.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    commands: Rc<RefCell<Vec<RenderCommand>>>,
}

impl RenderLog {
    pub fn push(&self, command: RenderCommand) {
        self.commands.borrow_mut().push(command);
    }

    pub fn commands(&self) -> Vec<RenderCommand> {
        self.commands.borrow().clone()
    }

    pub fn take(&self) -> Vec<RenderCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    /// Tiles drawn into `layer`, in submission order.
    pub fn tiles_for(&self, layer: LayerId) -> Vec<Tile> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::RenderTile { layer: l, tile, .. } if *l == layer => Some(*tile),
                _ => None,
            })
            .collect()
    }
}

/// Renderer that draws nothing and records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    log: RenderLog,
}

impl RecordingRenderer {
    pub fn new(log: RenderLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &RenderLog {
        &self.log
    }
}

impl Renderer for RecordingRenderer {
    fn start_layer(&mut self, layer: &LayerContext<'_>, rect: &Rect) {
        self.log.push(RenderCommand::StartLayer {
            layer: layer.id,
            rect: *rect,
        });
    }

    fn render_tile(
        &mut self,
        tile: &Tile,
        texture: &dyn Texture,
        layer: &LayerContext<'_>,
        layer_z: usize,
    ) {
        self.log.push(RenderCommand::RenderTile {
            layer: layer.id,
            tile: *tile,
            layer_z,
            texture_width: texture.width(),
            texture_height: texture.height(),
        });
    }

    fn end_layer(&mut self, layer: &LayerContext<'_>, rect: &Rect) {
        self.log.push(RenderCommand::EndLayer {
            layer: layer.id,
            rect: *rect,
        });
    }
}
