//! Spatial partitioning of panoramic media into levels of tiles.

pub mod cube;
pub mod equirect;
pub mod flat;
pub mod level;
pub mod tile;

pub use cube::CubeGeometry;
pub use equirect::EquirectGeometry;
pub use flat::FlatGeometry;
pub use level::{CubeLevelDesc, EquirectLevelDesc, FlatLevelDesc, Level};
pub use tile::{Face, GeometryId, Tile, TileAddress};

use serde::{Deserialize, Serialize};
use view::{LevelExtent, View, ViewKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Cube,
    Equirect,
    Flat,
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryKind::Cube => f.write_str("cube"),
            GeometryKind::Equirect => f.write_str("equirect"),
            GeometryKind::Flat => f.write_str("flat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    NoLevels,
    NoSelectableLevel,
    ZeroSize { level: u32 },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::NoLevels => write!(f, "geometry has no levels"),
            GeometryError::NoSelectableLevel => {
                write!(f, "every level is fallback-only; nothing can be selected")
            }
            GeometryError::ZeroSize { level } => {
                write!(f, "level {level} has a zero image or tile dimension")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Serializable description of a geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometryDesc {
    Cube { levels: Vec<CubeLevelDesc> },
    Equirect { levels: Vec<EquirectLevelDesc> },
    Flat { levels: Vec<FlatLevelDesc> },
}

impl GeometryDesc {
    pub fn build(&self) -> Result<Geometry, GeometryError> {
        Ok(match self {
            GeometryDesc::Cube { levels } => Geometry::Cube(CubeGeometry::new(levels)?),
            GeometryDesc::Equirect { levels } => Geometry::Equirect(EquirectGeometry::new(levels)?),
            GeometryDesc::Flat { levels } => Geometry::Flat(FlatGeometry::new(levels)?),
        })
    }
}

/// Closed set of geometries. Immutable once built.
#[derive(Debug, Clone)]
pub enum Geometry {
    Cube(CubeGeometry),
    Equirect(EquirectGeometry),
    Flat(FlatGeometry),
}

impl From<CubeGeometry> for Geometry {
    fn from(g: CubeGeometry) -> Self {
        Geometry::Cube(g)
    }
}

impl From<EquirectGeometry> for Geometry {
    fn from(g: EquirectGeometry) -> Self {
        Geometry::Equirect(g)
    }
}

impl From<FlatGeometry> for Geometry {
    fn from(g: FlatGeometry) -> Self {
        Geometry::Flat(g)
    }
}

impl Geometry {
    pub fn id(&self) -> GeometryId {
        match self {
            Geometry::Cube(g) => g.id(),
            Geometry::Equirect(g) => g.id(),
            Geometry::Flat(g) => g.id(),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Cube(_) => GeometryKind::Cube,
            Geometry::Equirect(_) => GeometryKind::Equirect,
            Geometry::Flat(_) => GeometryKind::Flat,
        }
    }

    /// The view kind whose projection this geometry can be culled against.
    pub fn view_kind(&self) -> ViewKind {
        match self {
            Geometry::Cube(_) | Geometry::Equirect(_) => ViewKind::Rectilinear,
            Geometry::Flat(_) => ViewKind::Flat,
        }
    }

    /// All levels, coarsest first.
    pub fn level_list(&self) -> &[Level] {
        match self {
            Geometry::Cube(g) => g.levels(),
            Geometry::Equirect(g) => g.levels(),
            Geometry::Flat(g) => g.levels(),
        }
    }

    pub fn level(&self, z: u32) -> Option<&Level> {
        self.level_list().get(z as usize)
    }

    /// Levels eligible for selection (everything not marked fallback-only).
    pub fn selectable_level_list(&self) -> Vec<&Level> {
        self.level_list().iter().filter(|l| !l.fallback_only).collect()
    }

    pub fn max_level(&self) -> u32 {
        self.level_list().len().saturating_sub(1) as u32
    }

    /// Every tile of level `z`, in ascending tile order.
    pub fn level_tiles(&self, z: u32) -> Vec<Tile> {
        let Some(level) = self.level(z) else {
            return Vec::new();
        };
        let id = self.id();
        let mut out = Vec::with_capacity(level.tile_count() as usize);
        match self {
            Geometry::Cube(_) => {
                for face in Face::ALL {
                    for y in 0..level.rows() {
                        for x in 0..level.cols() {
                            out.push(Tile::cube(id, z, face, x, y));
                        }
                    }
                }
            }
            Geometry::Equirect(_) | Geometry::Flat(_) => {
                for y in 0..level.rows() {
                    for x in 0..level.cols() {
                        out.push(Tile::grid(id, z, x, y));
                    }
                }
            }
        }
        out.sort();
        out
    }

    /// What a view sees of `level` when deciding whether it is dense enough.
    pub fn selection_extent(&self, level: &Level) -> LevelExtent {
        match self {
            Geometry::Cube(_) => LevelExtent::new(f64::from(level.width), f64::from(level.height)),
            // A quarter of the equator spans 90°, like a cube face.
            Geometry::Equirect(_) => {
                let face = f64::from(level.width) / 4.0;
                LevelExtent::new(face, face)
            }
            Geometry::Flat(_) => LevelExtent::new(f64::from(level.width), f64::from(level.height)),
        }
    }

    /// Lowest selectable level dense enough for `view`.
    pub fn select_level(&self, view: &View, pixel_ratio: f64) -> Option<u32> {
        let selectable = self.selectable_level_list();
        let extents: Vec<LevelExtent> =
            selectable.iter().map(|l| self.selection_extent(l)).collect();
        let i = view.select_level(&extents, pixel_ratio)?;
        selectable.get(i).map(|l| l.z)
    }

    /// Appends to `out` the tiles of level `z` that `view` can see.
    ///
    /// A view of the wrong kind yields nothing; pairings are validated when a
    /// layer is added to a stage.
    pub fn visible_tiles_into(&self, view: &View, z: u32, out: &mut Vec<Tile>) {
        match (self, view) {
            (Geometry::Cube(g), View::Rectilinear(v)) => g.visible_tiles(v, z, out),
            (Geometry::Equirect(g), View::Rectilinear(v)) => g.visible_tiles(v, z, out),
            (Geometry::Flat(g), View::Flat(v)) => g.visible_tiles(v, z, out),
            _ => tracing::warn!(
                geometry = %self.kind(),
                view = %view.kind(),
                "view cannot be projected onto geometry"
            ),
        }
    }

    pub fn visible_tiles(&self, view: &View, z: u32) -> Vec<Tile> {
        let mut out = Vec::new();
        self.visible_tiles_into(view, z, &mut out);
        out
    }

    /// The tile one level coarser that covers the centre of `tile`.
    pub fn parent(&self, tile: &Tile) -> Option<Tile> {
        if tile.geometry != self.id() {
            return None;
        }
        match self {
            Geometry::Cube(g) => g.parent(tile),
            Geometry::Equirect(g) => g.parent(tile),
            Geometry::Flat(g) => g.parent(tile),
        }
    }

    /// The tiles one level finer that overlap `tile`.
    pub fn children(&self, tile: &Tile) -> Vec<Tile> {
        if tile.geometry != self.id() {
            return Vec::new();
        }
        match self {
            Geometry::Cube(g) => g.children(tile),
            Geometry::Equirect(g) => g.children(tile),
            Geometry::Flat(g) => g.children(tile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CubeLevelDesc, FlatLevelDesc, Geometry, GeometryDesc, GeometryError, GeometryKind,
    };
    use view::{FlatParams, FlatView, RectilinearView, View, ViewKind};

    fn flat_levels() -> Vec<FlatLevelDesc> {
        vec![
            FlatLevelDesc {
                width: 500,
                height: 500,
                tile_width: 500,
                tile_height: 500,
                fallback_only: true,
            },
            FlatLevelDesc {
                width: 1000,
                height: 1000,
                tile_width: 500,
                tile_height: 500,
                fallback_only: false,
            },
            FlatLevelDesc {
                width: 2000,
                height: 2000,
                tile_width: 500,
                tile_height: 500,
                fallback_only: false,
            },
        ]
    }

    #[test]
    fn desc_parses_from_json() {
        let desc: GeometryDesc = serde_json::from_str(
            r#"{"type": "cube", "levels": [{"tile_size": 256, "size": 256}]}"#,
        )
        .unwrap();
        let g = desc.build().unwrap();
        assert_eq!(g.kind(), GeometryKind::Cube);
        assert_eq!(g.view_kind(), ViewKind::Rectilinear);
        assert_eq!(g.max_level(), 0);
    }

    #[test]
    fn level_tiles_enumerates_the_whole_level() {
        let g = GeometryDesc::Flat {
            levels: flat_levels(),
        }
        .build()
        .unwrap();
        let tiles = g.level_tiles(2);
        assert_eq!(tiles.len(), 16);
        assert!(tiles.windows(2).all(|w| w[0] < w[1]));
        assert!(g.level_tiles(3).is_empty());

        let cube = GeometryDesc::Cube {
            levels: vec![CubeLevelDesc {
                tile_size: 256,
                size: 512,
                fallback_only: false,
            }],
        }
        .build()
        .unwrap();
        assert_eq!(cube.level_tiles(0).len(), 24);
    }

    #[test]
    fn rejects_bad_levels() {
        let err = GeometryDesc::Cube { levels: vec![] }.build().unwrap_err();
        assert_eq!(err, GeometryError::NoLevels);

        let err = GeometryDesc::Cube {
            levels: vec![CubeLevelDesc {
                tile_size: 0,
                size: 256,
                fallback_only: false,
            }],
        }
        .build()
        .unwrap_err();
        assert_eq!(err, GeometryError::ZeroSize { level: 0 });

        let mut levels = flat_levels();
        levels.truncate(1);
        let err = GeometryDesc::Flat { levels }.build().unwrap_err();
        assert_eq!(err, GeometryError::NoSelectableLevel);
    }

    #[test]
    fn selection_skips_fallback_levels() {
        let g = GeometryDesc::Flat {
            levels: flat_levels(),
        }
        .build()
        .unwrap();
        assert_eq!(g.selectable_level_list().len(), 2);

        // 300 px wide viewport showing the whole 500 px fallback level would
        // suffice, but it is not selectable.
        let view = View::from(FlatView::new(FlatParams {
            width: 300.0,
            height: 300.0,
            ..FlatParams::default()
        }));
        assert_eq!(g.select_level(&view, 1.0), Some(1));

        let view = View::from(FlatView::new(FlatParams {
            width: 1500.0,
            height: 1500.0,
            ..FlatParams::default()
        }));
        assert_eq!(g.select_level(&view, 1.0), Some(2));
    }

    #[test]
    fn mismatched_view_sees_nothing() {
        let g: Geometry = GeometryDesc::Flat {
            levels: flat_levels(),
        }
        .build()
        .unwrap();
        let view = View::from(RectilinearView::default());
        assert!(g.visible_tiles(&view, 1).is_empty());
    }
}
