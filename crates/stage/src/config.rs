use serde::{Deserialize, Serialize};
use streaming::TextureStoreConfig;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Also load every ancestor of a visible tile, so coarse fallbacks
    /// appear before the selected level.
    pub progressive: bool,
    /// Device pixels per stage pixel, used for level selection.
    pub pixel_ratio: f64,
    pub previously_visible_cache_size: usize,
    pub max_concurrent_loads: usize,
    pub retry_delay_s: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        let store = TextureStoreConfig::default();
        Self {
            progressive: false,
            pixel_ratio: 1.0,
            previously_visible_cache_size: store.previously_visible_cache_size,
            max_concurrent_loads: store.max_concurrent_loads,
            retry_delay_s: store.retry_delay_s,
        }
    }
}

impl StageConfig {
    pub fn store_config(&self) -> TextureStoreConfig {
        TextureStoreConfig {
            previously_visible_cache_size: self.previously_visible_cache_size,
            max_concurrent_loads: self.max_concurrent_loads,
            retry_delay_s: self.retry_delay_s,
        }
    }
}
