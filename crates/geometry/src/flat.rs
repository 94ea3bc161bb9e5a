use foundation::Aabb2;
use view::FlatView;

use crate::GeometryError;
use crate::level::{FlatLevelDesc, Level, build_levels, child_cells, parent_cell};
use crate::tile::{GeometryId, Tile, TileAddress};

/// A flat image cut into a tile grid per level.
#[derive(Debug, Clone)]
pub struct FlatGeometry {
    id: GeometryId,
    levels: Vec<Level>,
}

impl FlatGeometry {
    pub fn new(levels: &[FlatLevelDesc]) -> Result<Self, GeometryError> {
        let levels = levels
            .iter()
            .map(|d| Level {
                z: 0,
                width: d.width,
                height: d.height,
                tile_width: d.tile_width,
                tile_height: d.tile_height,
                fallback_only: d.fallback_only,
            })
            .collect();
        Ok(Self {
            id: GeometryId::next(),
            levels: build_levels(levels, |l| u64::from(l.width) * u64::from(l.height))?,
        })
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Tiles of level `z` strictly overlapping the framed region, row-major.
    pub fn visible_tiles(&self, view: &FlatView, z: u32, out: &mut Vec<Tile>) {
        let Some(level) = self.levels.get(z as usize) else {
            return;
        };
        let image = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let Some(region) = view.visible_region().intersection(&image) else {
            return;
        };
        out.extend(
            level
                .tiles_overlapping(&region)
                .into_iter()
                .map(|(x, y)| Tile::grid(self.id, z, x, y)),
        );
    }

    /// Tile of level `z` at normalized image coordinates.
    pub fn tile_at(&self, z: u32, u: f64, v: f64) -> Option<Tile> {
        let level = self.levels.get(z as usize)?;
        let (x, y) = level.tile_at(u, v);
        Some(Tile::grid(self.id, z, x, y))
    }

    pub fn parent(&self, tile: &Tile) -> Option<Tile> {
        let TileAddress::Grid { x, y } = tile.address else {
            return None;
        };
        let (z, px, py) = parent_cell(&self.levels, tile.z, x, y)?;
        Some(Tile::grid(self.id, z, px, py))
    }

    pub fn children(&self, tile: &Tile) -> Vec<Tile> {
        let TileAddress::Grid { x, y } = tile.address else {
            return Vec::new();
        };
        child_cells(&self.levels, tile.z, x, y)
            .into_iter()
            .map(|(z, cx, cy)| Tile::grid(self.id, z, cx, cy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FlatGeometry;
    use crate::level::FlatLevelDesc;
    use crate::tile::Tile;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use view::{FlatParams, FlatView};

    fn quadrants() -> FlatGeometry {
        FlatGeometry::new(&[FlatLevelDesc {
            width: 1000,
            height: 1000,
            tile_width: 500,
            tile_height: 500,
            fallback_only: false,
        }])
        .unwrap()
    }

    fn framed(x: f64, y: f64, zoom: f64) -> FlatView {
        FlatView::new(FlatParams {
            x,
            y,
            zoom,
            media_aspect_ratio: 1.0,
            width: 300.0,
            height: 300.0,
        })
    }

    #[test]
    fn top_left_quadrant_returns_one_tile() {
        let g = quadrants();
        let mut out = Vec::new();
        g.visible_tiles(&framed(0.25, 0.25, 0.5), 0, &mut out);
        assert_eq!(out, vec![Tile::grid(g.id(), 0, 0, 0)]);
    }

    #[test]
    fn whole_image_returns_all_tiles() {
        let g = quadrants();
        let mut out = Vec::new();
        g.visible_tiles(&framed(0.5, 0.5, 1.0), 0, &mut out);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn view_outside_the_image_sees_nothing() {
        let g = quadrants();
        let mut out = Vec::new();
        g.visible_tiles(&framed(2.0, 2.0, 0.5), 0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn random_views_are_covered() {
        let g = FlatGeometry::new(&[FlatLevelDesc {
            width: 3000,
            height: 2000,
            tile_width: 256,
            tile_height: 256,
            fallback_only: false,
        }])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let view = FlatView::new(FlatParams {
                x: rng.random_range(0.0..1.0),
                y: rng.random_range(0.0..1.0),
                zoom: rng.random_range(0.05..1.2),
                media_aspect_ratio: 1.5,
                width: 400.0,
                height: 300.0,
            });
            let mut out = Vec::new();
            g.visible_tiles(&view, 0, &mut out);
            for _ in 0..100 {
                let (u, v) = view
                    .screen_to_coordinates(
                        rng.random_range(0.5..399.5),
                        rng.random_range(0.5..299.5),
                    )
                    .unwrap();
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let tile = g.tile_at(0, u, v).unwrap();
                assert!(out.contains(&tile), "{tile} missing");
            }
        }
    }
}
