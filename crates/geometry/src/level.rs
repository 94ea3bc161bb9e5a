use foundation::Aabb2;
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// One resolution tier, as a grid of tiles over a `width`×`height` image.
///
/// Edge tiles are partial when the tile size does not divide the image
/// size. Tile extents are reported in normalized image coordinates (`0..1`
/// on both axes, `y` downwards).
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Level {
    pub z: u32,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub fallback_only: bool,
}

impl Level {
    pub(crate) fn validated(self) -> Result<Self, GeometryError> {
        if self.width == 0 || self.height == 0 || self.tile_width == 0 || self.tile_height == 0 {
            return Err(GeometryError::ZeroSize { level: self.z });
        }
        Ok(self)
    }

    pub fn cols(&self) -> u32 {
        self.width.div_ceil(self.tile_width)
    }

    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.tile_height)
    }

    pub fn tile_count(&self) -> u32 {
        self.cols() * self.rows()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.cols() && y < self.rows()
    }

    pub fn tile_extent(&self, x: u32, y: u32) -> Aabb2 {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let x0 = f64::from(x * self.tile_width);
        let y0 = f64::from(y * self.tile_height);
        let x1 = f64::from(((x + 1) * self.tile_width).min(self.width));
        let y1 = f64::from(((y + 1) * self.tile_height).min(self.height));
        Aabb2::new([x0 / w, y0 / h], [x1 / w, y1 / h])
    }

    /// Tile containing the normalized point, clamped to the grid.
    pub fn tile_at(&self, u: f64, v: f64) -> (u32, u32) {
        let col = (u * f64::from(self.width) / f64::from(self.tile_width)).floor();
        let row = (v * f64::from(self.height) / f64::from(self.tile_height)).floor();
        (
            clamp_index(col, self.cols()),
            clamp_index(row, self.rows()),
        )
    }

    /// Tiles whose extent strictly overlaps `region`, row by row.
    pub fn tiles_overlapping(&self, region: &Aabb2) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        if region.is_empty() {
            return out;
        }
        let (x0, y0) = self.tile_at(region.min[0], region.min[1]);
        let (x1, y1) = self.tile_at(region.max[0], region.max[1]);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.tile_extent(x, y).intersects(region) {
                    out.push((x, y));
                }
            }
        }
        out
    }
}

/// Cell at the next coarser level under the centre of `(x, y)`.
pub(crate) fn parent_cell(levels: &[Level], z: u32, x: u32, y: u32) -> Option<(u32, u32, u32)> {
    let level = levels.get(z as usize)?;
    let parent_z = z.checked_sub(1)?;
    let parent = levels.get(parent_z as usize)?;
    let e = level.tile_extent(x, y);
    let (px, py) = parent.tile_at((e.min[0] + e.max[0]) / 2.0, (e.min[1] + e.max[1]) / 2.0);
    Some((parent_z, px, py))
}

/// Cells at the next finer level overlapping `(x, y)`.
pub(crate) fn child_cells(levels: &[Level], z: u32, x: u32, y: u32) -> Vec<(u32, u32, u32)> {
    let (Some(level), Some(child)) = (levels.get(z as usize), levels.get(z as usize + 1)) else {
        return Vec::new();
    };
    child
        .tiles_overlapping(&level.tile_extent(x, y))
        .into_iter()
        .map(|(cx, cy)| (z + 1, cx, cy))
        .collect()
}

fn clamp_index(v: f64, len: u32) -> u32 {
    if v.is_nan() || v <= 0.0 {
        return 0;
    }
    // Saturating float-to-int cast.
    (v as u32).min(len.saturating_sub(1))
}

/// Level of a cube geometry: square faces of `size` pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeLevelDesc {
    pub tile_size: u32,
    pub size: u32,
    #[serde(default)]
    pub fallback_only: bool,
}

/// Level of an equirectangular geometry, `width` pixels around the equator.
///
/// Without tile sizes the whole panorama is a single tile.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquirectLevelDesc {
    pub width: u32,
    #[serde(default)]
    pub tile_width: Option<u32>,
    #[serde(default)]
    pub tile_height: Option<u32>,
    #[serde(default)]
    pub fallback_only: bool,
}

impl EquirectLevelDesc {
    pub fn single(width: u32) -> Self {
        Self {
            width,
            tile_width: None,
            tile_height: None,
            fallback_only: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatLevelDesc {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default)]
    pub fallback_only: bool,
}

/// Orders levels by size and assigns their indices.
pub(crate) fn build_levels(
    mut levels: Vec<Level>,
    size: impl Fn(&Level) -> u64,
) -> Result<Vec<Level>, GeometryError> {
    if levels.is_empty() {
        return Err(GeometryError::NoLevels);
    }
    levels.sort_by_key(|l| size(l));
    let levels = levels
        .into_iter()
        .enumerate()
        .map(|(z, l)| Level { z: z as u32, ..l }.validated())
        .collect::<Result<Vec<_>, _>>()?;
    if levels.iter().all(|l| l.fallback_only) {
        return Err(GeometryError::NoSelectableLevel);
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::{EquirectLevelDesc, Level};
    use foundation::Aabb2;
    use pretty_assertions::assert_eq;

    fn level(width: u32, height: u32, tw: u32, th: u32) -> Level {
        Level {
            z: 0,
            width,
            height,
            tile_width: tw,
            tile_height: th,
            fallback_only: false,
        }
    }

    #[test]
    fn partial_edge_tiles() {
        let l = level(1000, 600, 512, 512);
        assert_eq!((l.cols(), l.rows()), (2, 2));
        let edge = l.tile_extent(1, 1);
        assert_eq!(edge.min, [0.512, 512.0 / 600.0]);
        assert_eq!(edge.max, [1.0, 1.0]);
    }

    #[test]
    fn tile_at_clamps_to_grid() {
        let l = level(1000, 1000, 500, 500);
        assert_eq!(l.tile_at(0.25, 0.75), (0, 1));
        assert_eq!(l.tile_at(1.0, 1.0), (1, 1));
        assert_eq!(l.tile_at(-0.5, 2.0), (0, 1));
    }

    #[test]
    fn overlapping_excludes_shared_edges() {
        let l = level(1000, 1000, 500, 500);
        let tiles = l.tiles_overlapping(&Aabb2::new([0.0, 0.0], [0.5, 0.5]));
        assert_eq!(tiles, vec![(0, 0)]);
        let tiles = l.tiles_overlapping(&Aabb2::new([0.4, 0.4], [0.6, 0.6]));
        assert_eq!(tiles, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn equirect_desc_defaults_to_single_tile() {
        let desc: EquirectLevelDesc = serde_json::from_str(r#"{"width": 4096}"#).unwrap();
        assert_eq!(desc, EquirectLevelDesc::single(4096));
    }
}
