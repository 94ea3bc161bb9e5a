use foundation::Time;
use geometry::Tile;

use crate::asset::StaticAsset;
use crate::load::{Completer, LoadError, LoadHandle, Source, load_channel};

/// Fabricates blank assets of a fixed size. Each load is answered after
/// `delay_polls` calls to [`Source::poll`], or immediately when zero.
#[derive(Debug)]
pub struct SyntheticSource {
    tile_width: u32,
    tile_height: u32,
    delay_polls: u32,
    failing_level: Option<u32>,
    pending: Vec<(u32, Tile, Completer)>,
    requested: u64,
}

impl SyntheticSource {
    pub fn new(tile_width: u32, tile_height: u32, delay_polls: u32) -> Self {
        Self {
            tile_width,
            tile_height,
            delay_polls,
            failing_level: None,
            pending: Vec::new(),
            requested: 0,
        }
    }

    /// Every load for level `z` fails with a network error.
    pub fn with_failing_level(mut self, z: u32) -> Self {
        self.failing_level = Some(z);
        self
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn answer(&self, tile: &Tile) -> Result<Box<dyn crate::Asset>, LoadError> {
        if self.failing_level == Some(tile.z) {
            return Err(LoadError::network(format!("synthetic failure for {tile}")));
        }
        Ok(Box::new(StaticAsset::new(self.tile_width, self.tile_height, *tile)))
    }
}

impl Source for SyntheticSource {
    fn load_asset(&mut self, tile: &Tile) -> LoadHandle {
        self.requested += 1;
        if self.delay_polls == 0 {
            return LoadHandle::ready(self.answer(tile));
        }
        let (handle, completer) = load_channel();
        self.pending.push((self.delay_polls, *tile, completer));
        handle
    }

    fn poll(&mut self, _now: Time) {
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for (remaining, tile, completer) in std::mem::take(&mut self.pending) {
            if completer.is_cancelled() {
                continue;
            }
            if remaining <= 1 {
                completer.complete(self.answer(&tile));
            } else {
                still_pending.push((remaining - 1, tile, completer));
            }
        }
        self.pending = still_pending;
    }
}
