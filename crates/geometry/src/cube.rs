use foundation::Aabb2;
use foundation::math::Vec3;
use view::{Frustum, RectilinearView};

use crate::level::{CubeLevelDesc, Level, build_levels, child_cells, parent_cell};
use crate::tile::{Face, GeometryId, Tile, TileAddress};
use crate::GeometryError;

/// Six square faces around the viewer, each a tile grid per level.
#[derive(Debug, Clone)]
pub struct CubeGeometry {
    id: GeometryId,
    levels: Vec<Level>,
}

impl CubeGeometry {
    pub fn new(levels: &[CubeLevelDesc]) -> Result<Self, GeometryError> {
        let levels = levels
            .iter()
            .map(|d| Level {
                z: 0,
                width: d.size,
                height: d.size,
                tile_width: d.tile_size,
                tile_height: d.tile_size,
                fallback_only: d.fallback_only,
            })
            .collect();
        Ok(Self {
            id: GeometryId::next(),
            levels: build_levels(levels, |l| u64::from(l.width))?,
        })
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Tiles of level `z` that cover part of the view cone.
    ///
    /// Faces are culled as a whole first; on a surviving face only the tiles
    /// under the bounding box of the clipped face are tested, each with an
    /// exact polygon clip.
    pub fn visible_tiles(&self, view: &RectilinearView, z: u32, out: &mut Vec<Tile>) {
        let Some(level) = self.levels.get(z as usize) else {
            return;
        };
        let frustum = view.frustum();
        for face in Face::ALL {
            let whole = face_polygon(face, -0.5, 0.5, -0.5, 0.5);
            if !frustum.intersects_polygon(&whole) {
                continue;
            }
            let clipped = frustum.clip_polygon(&whole);
            let (_, u, v) = face.basis();
            let mut region = Aabb2::new([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
            for p in &clipped {
                // Image coordinates: columns follow `right`, rows run down.
                let (iu, iv) = (p.dot(u) + 0.5, 0.5 - p.dot(v));
                region.min = [region.min[0].min(iu), region.min[1].min(iv)];
                region.max = [region.max[0].max(iu), region.max[1].max(iv)];
            }
            for (x, y) in level.tiles_overlapping(&region) {
                if tile_visible(&frustum, face, level, x, y) {
                    out.push(Tile::cube(self.id, z, face, x, y));
                }
            }
        }
    }

    /// Tile of level `z` under the ray `v`.
    pub fn tile_at(&self, z: u32, v: Vec3) -> Option<Tile> {
        let level = self.levels.get(z as usize)?;
        let (face, s, t) = Face::project(v)?;
        let (x, y) = level.tile_at(s + 0.5, 0.5 - t);
        Some(Tile::cube(self.id, z, face, x, y))
    }

    pub fn parent(&self, tile: &Tile) -> Option<Tile> {
        let TileAddress::Cube { face, x, y } = tile.address else {
            return None;
        };
        let (z, px, py) = parent_cell(&self.levels, tile.z, x, y)?;
        Some(Tile::cube(self.id, z, face, px, py))
    }

    pub fn children(&self, tile: &Tile) -> Vec<Tile> {
        let TileAddress::Cube { face, x, y } = tile.address else {
            return Vec::new();
        };
        child_cells(&self.levels, tile.z, x, y)
            .into_iter()
            .map(|(z, cx, cy)| Tile::cube(self.id, z, face, cx, cy))
            .collect()
    }
}

fn face_polygon(face: Face, s0: f64, s1: f64, t0: f64, t1: f64) -> [Vec3; 4] {
    let (n, u, v) = face.basis();
    let c = n.scale(0.5);
    let at = |s: f64, t: f64| c + u.scale(s) + v.scale(t);
    [at(s0, t0), at(s1, t0), at(s1, t1), at(s0, t1)]
}

fn tile_visible(frustum: &Frustum, face: Face, level: &Level, x: u32, y: u32) -> bool {
    let e = level.tile_extent(x, y);
    let (s0, s1) = (e.min[0] - 0.5, e.max[0] - 0.5);
    let (t0, t1) = (0.5 - e.max[1], 0.5 - e.min[1]);
    frustum.intersects_polygon(&face_polygon(face, s0, s1, t0, t1))
}
