use std::collections::{BTreeMap, BTreeSet};

use foundation::Time;
use geometry::Tile;
use runtime::{EventBus, FrameBudget, WorkQueue};
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::cache::TileLru;
use crate::load::{LoadError, Source};
use crate::residency::{Resident, Residency, ResidencyState};
use crate::texture::{Texture, TextureError, TextureFactory};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureStoreConfig {
    /// How many no-longer-visible tiles keep their textures.
    pub previously_visible_cache_size: usize,
    pub max_concurrent_loads: usize,
    /// Seconds before a tile whose load failed with a network error is
    /// tried again.
    pub retry_delay_s: f64,
}

impl Default for TextureStoreConfig {
    fn default() -> Self {
        Self {
            previously_visible_cache_size: 512,
            max_concurrent_loads: 4,
            retry_delay_s: 10.0,
        }
    }
}

/// `Idle → Started → Marking → Ended → Idle`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Started,
    Marking,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    LoadStarted(Tile),
    Loaded(Tile),
    Failed { tile: Tile, error: LoadError },
    TextureFailed { tile: Tile, error: TextureError },
    /// A queued or in-flight load was abandoned.
    Cancelled(Tile),
    /// A loaded tile's asset and texture were destroyed.
    Unloaded(Tile),
    /// A dynamic asset changed and its texture was rebuilt.
    Refreshed(Tile),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TileQuery {
    pub visible: bool,
    pub previously_visible: bool,
    pub has_asset: bool,
    pub has_texture: bool,
    pub pinned: bool,
    pub pin_count: u32,
    pub state: Option<ResidencyState>,
}

/// Owns the assets and textures of one layer.
///
/// Each frame the stage marks the tiles it wants to draw between
/// `start_frame` and `end_frame`. Marked tiles are loaded; tiles that stop
/// being marked linger in a bounded cache of previously visible tiles and
/// are released once they fall out of it, unless pinned.
pub struct TextureStore {
    source: Box<dyn Source>,
    factory: Box<dyn TextureFactory>,
    config: TextureStoreConfig,
    frame: FrameState,
    now: Time,
    entries: BTreeMap<Tile, Residency>,
    visible: BTreeSet<Tile>,
    last_visible: BTreeSet<Tile>,
    previously_visible: TileLru,
    pins: BTreeMap<Tile, u32>,
    queue: WorkQueue<Tile>,
    loading: usize,
    events: EventBus<StoreEvent>,
}

impl std::fmt::Debug for TextureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureStore")
            .field("config", &self.config)
            .field("frame", &self.frame)
            .field("entries", &self.entries.len())
            .field("visible", &self.visible.len())
            .field("previously_visible", &self.previously_visible.len())
            .field("pins", &self.pins.len())
            .field("queued", &self.queue.len())
            .field("loading", &self.loading)
            .finish()
    }
}

impl TextureStore {
    pub fn new(
        source: Box<dyn Source>,
        factory: Box<dyn TextureFactory>,
        config: TextureStoreConfig,
    ) -> Self {
        Self {
            source,
            factory,
            config,
            frame: FrameState::Idle,
            now: Time::ZERO,
            entries: BTreeMap::new(),
            visible: BTreeSet::new(),
            last_visible: BTreeSet::new(),
            previously_visible: TileLru::new(config.previously_visible_cache_size),
            pins: BTreeMap::new(),
            queue: WorkQueue::new(),
            loading: 0,
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &TextureStoreConfig {
        &self.config
    }

    pub fn frame_state(&self) -> FrameState {
        self.frame
    }

    pub fn source_mut(&mut self) -> &mut dyn Source {
        self.source.as_mut()
    }

    fn expect_frame(&self, op: &str, allowed: &[FrameState]) {
        if !allowed.contains(&self.frame) {
            panic!("TextureStore::{op} called out of sequence (frame state {:?})", self.frame);
        }
    }

    pub fn start_frame(&mut self, now: Time) {
        self.expect_frame("start_frame", &[FrameState::Idle]);
        self.frame = FrameState::Started;
        self.now = now;
        self.last_visible = std::mem::take(&mut self.visible);
        self.source.poll(now);
        self.collect_completed();
        self.refresh_dynamic();
    }

    pub fn mark_tile(&mut self, tile: Tile) {
        self.expect_frame("mark_tile", &[FrameState::Started, FrameState::Marking]);
        self.frame = FrameState::Marking;
        if self.visible.insert(tile) {
            self.previously_visible.remove(&tile);
            self.want(tile);
        }
    }

    pub fn end_frame(&mut self) {
        self.expect_frame("end_frame", &[FrameState::Started, FrameState::Marking]);
        self.frame = FrameState::Ended;

        let hidden: Vec<Tile> = self.last_visible.difference(&self.visible).copied().collect();
        for tile in hidden {
            if matches!(self.entries.get(&tile), Some(Residency::Loaded(_))) {
                self.previously_visible.insert(tile);
            }
        }
        let pinned: Vec<Tile> = self.pins.keys().copied().collect();
        for tile in pinned {
            self.want(tile);
        }
        self.sweep();
        self.start_loads();
        self.collect_completed();

        tracing::trace!(
            visible = self.visible.len(),
            resident = self.entries.len(),
            loading = self.loading,
            queued = self.queue.len(),
            "texture store frame ended"
        );
        self.frame = FrameState::Idle;
    }

    /// Keeps `tile` loaded regardless of visibility. Returns the new pin
    /// count.
    pub fn pin(&mut self, tile: Tile) -> u32 {
        let count = self.pins.entry(tile).or_insert(0);
        *count += 1;
        let count = *count;
        self.want(tile);
        count
    }

    /// Returns the remaining pin count. A tile unpinned outside a frame
    /// that is not otherwise wanted is released at once.
    pub fn unpin(&mut self, tile: Tile) -> u32 {
        let Some(count) = self.pins.get_mut(&tile) else {
            return 0;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.pins.remove(&tile);
            if self.frame == FrameState::Idle && !self.is_wanted(&tile) {
                self.release(tile);
            }
        }
        remaining
    }

    pub fn query(&self, tile: &Tile) -> TileQuery {
        let entry = self.entries.get(tile);
        let loaded = matches!(entry, Some(Residency::Loaded(_)));
        let pin_count = self.pins.get(tile).copied().unwrap_or(0);
        TileQuery {
            visible: self.visible.contains(tile),
            previously_visible: self.previously_visible.contains(tile),
            has_asset: loaded,
            has_texture: loaded,
            pinned: pin_count > 0,
            pin_count,
            state: entry.map(Residency::state),
        }
    }

    pub fn texture(&self, tile: &Tile) -> Option<&dyn Texture> {
        match self.entries.get(tile) {
            Some(Residency::Loaded(r)) => Some(r.texture.as_ref()),
            _ => None,
        }
    }

    pub fn asset(&self, tile: &Tile) -> Option<&dyn Asset> {
        match self.entries.get(tile) {
            Some(Residency::Loaded(r)) => Some(r.asset.as_ref()),
            _ => None,
        }
    }

    pub fn has_texture(&self, tile: &Tile) -> bool {
        matches!(self.entries.get(tile), Some(Residency::Loaded(_)))
    }

    /// True while any load is queued or in flight.
    pub fn is_busy(&self) -> bool {
        self.loading > 0 || !self.queue.is_empty()
    }

    pub fn loading_count(&self) -> usize {
        self.loading
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn resident_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Residency::Loaded(_)))
            .count()
    }

    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.events.drain_events().collect()
    }

    /// Releases every tile, visible or not.
    pub fn clear(&mut self) {
        self.expect_frame("clear", &[FrameState::Idle]);
        let tiles: Vec<Tile> = self.entries.keys().copied().collect();
        for tile in tiles {
            self.release(tile);
        }
        self.visible.clear();
        self.last_visible.clear();
        self.previously_visible.clear();
    }

    fn is_wanted(&self, tile: &Tile) -> bool {
        self.visible.contains(tile)
            || self.pins.contains_key(tile)
            || self.previously_visible.contains(tile)
    }

    fn want(&mut self, tile: Tile) {
        let enqueue = match self.entries.get(&tile) {
            None => true,
            Some(entry) => entry.is_retry_due(self.now),
        };
        if enqueue {
            let id = self.queue.push(tile.z, tile);
            self.entries.insert(tile, Residency::Queued(id));
        }
    }

    fn sweep(&mut self) {
        let unwanted: Vec<Tile> = self
            .entries
            .keys()
            .filter(|t| !self.is_wanted(t))
            .copied()
            .collect();
        for tile in unwanted {
            self.release(tile);
        }
    }

    fn release(&mut self, tile: Tile) {
        self.previously_visible.remove(&tile);
        let Some(entry) = self.entries.remove(&tile) else {
            return;
        };
        match entry {
            Residency::Queued(id) => {
                self.queue.remove(id);
                self.events.emit(StoreEvent::Cancelled(tile));
            }
            Residency::Loading(handle) => {
                self.loading = self.loading.saturating_sub(1);
                if !handle.cancel()
                    && let Some(Ok(mut asset)) = handle.take()
                {
                    asset.destroy();
                }
                tracing::debug!(%tile, "cancelled asset load");
                self.events.emit(StoreEvent::Cancelled(tile));
            }
            Residency::Loaded(mut resident) => {
                resident.texture.destroy();
                resident.asset.destroy();
                tracing::debug!(%tile, "unloaded tile");
                self.events.emit(StoreEvent::Unloaded(tile));
            }
            Residency::Failed { .. } => {}
        }
    }

    fn start_loads(&mut self) {
        let mut budget = FrameBudget::from_slots(self.config.max_concurrent_loads, self.loading);
        while let Some((_, tile)) = self.queue.pop_within(&mut budget) {
            let handle = self.source.load_asset(&tile);
            self.entries.insert(tile, Residency::Loading(handle));
            self.loading += 1;
            tracing::debug!(%tile, "started asset load");
            self.events.emit(StoreEvent::LoadStarted(tile));
        }
    }

    fn collect_completed(&mut self) {
        let finished: Vec<Tile> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, Residency::Loading(h) if !h.is_pending()))
            .map(|(t, _)| *t)
            .collect();

        for tile in finished {
            let Some(Residency::Loading(handle)) = self.entries.remove(&tile) else {
                continue;
            };
            self.loading = self.loading.saturating_sub(1);
            let result = handle.take().unwrap_or(Err(LoadError::Cancelled));
            let entry = match result {
                Ok(mut asset) => match self.factory.create_texture(&tile, asset.as_ref()) {
                    Ok(texture) => {
                        tracing::debug!(%tile, "tile loaded");
                        self.events.emit(StoreEvent::Loaded(tile));
                        Residency::Loaded(Resident {
                            timestamp: asset.timestamp(),
                            asset,
                            texture,
                        })
                    }
                    Err(error) => {
                        tracing::warn!(%tile, %error, "failed to create texture");
                        asset.destroy();
                        self.events.emit(StoreEvent::TextureFailed { tile, error });
                        Residency::Failed {
                            error: LoadError::decode("texture creation failed"),
                            retry_at: None,
                        }
                    }
                },
                Err(error) => {
                    tracing::warn!(%tile, %error, "asset load failed");
                    let retry_at = error
                        .is_retryable()
                        .then(|| self.now.after(self.config.retry_delay_s));
                    self.events.emit(StoreEvent::Failed {
                        tile,
                        error: error.clone(),
                    });
                    Residency::Failed { error, retry_at }
                }
            };
            self.entries.insert(tile, entry);
        }
    }

    fn refresh_dynamic(&mut self) {
        for (tile, entry) in self.entries.iter_mut() {
            let Residency::Loaded(r) = entry else {
                continue;
            };
            if !r.asset.is_dynamic() || r.asset.timestamp() == r.timestamp {
                continue;
            }
            match r.texture.refresh(tile, r.asset.as_ref()) {
                Ok(()) => {
                    r.timestamp = r.asset.timestamp();
                    self.events.emit(StoreEvent::Refreshed(*tile));
                }
                Err(error) => tracing::warn!(%tile, %error, "failed to refresh texture"),
            }
        }
    }
}

impl Drop for TextureStore {
    fn drop(&mut self) {
        let tiles: Vec<Tile> = self.entries.keys().copied().collect();
        for tile in tiles {
            self.release(tile);
        }
    }
}
