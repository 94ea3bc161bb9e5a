use core::f64::consts::{FRAC_PI_2, PI, TAU};
use std::collections::BTreeSet;

use foundation::Aabb2;
use foundation::math::Vec3;
use foundation::util;
use view::{Frustum, RectilinearView, rectilinear};

use crate::GeometryError;
use crate::level::{EquirectLevelDesc, Level, build_levels, child_cells, parent_cell};
use crate::tile::{GeometryId, Tile, TileAddress};

/// Equirectangular panorama: columns span longitude, rows span latitude.
///
/// Image `x` runs from yaw `-π` to `π`; image `y` from the zenith
/// (pitch `-π/2`) down to the nadir.
#[derive(Debug, Clone)]
pub struct EquirectGeometry {
    id: GeometryId,
    levels: Vec<Level>,
}

/// Yaw/pitch bounding box of a view cone. `yaw_min` may lie outside
/// `[-π, π)`; the span never exceeds a full turn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConeBounds {
    pub yaw_min: f64,
    pub yaw_max: f64,
    pub pitch_min: f64,
    pub pitch_max: f64,
}

impl ConeBounds {
    pub fn wraps_fully(&self) -> bool {
        self.yaw_max - self.yaw_min >= TAU
    }

    /// The box in normalized image coordinates, split at the seam.
    fn image_regions(&self) -> Vec<Aabb2> {
        let v0 = (self.pitch_min + FRAC_PI_2) / PI;
        let v1 = (self.pitch_max + FRAC_PI_2) / PI;
        if self.wraps_fully() {
            return vec![Aabb2::new([0.0, v0], [1.0, v1])];
        }
        let u0 = (self.yaw_min + PI) / TAU;
        let u1 = (self.yaw_max + PI) / TAU;
        let unit = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        (-1..=1)
            .filter_map(|k| {
                let shift = f64::from(k);
                Aabb2::new([u0 + shift, v0], [u1 + shift, v1]).intersection(&unit)
            })
            .collect()
    }
}

/// Bounds of everything `view` can see.
///
/// Corner longitudes are unwrapped along the cone boundary; a pole inside
/// the cone opens the yaw range to a full turn. Latitude extremes come from
/// the corners and from the highest and lowest points of each boundary arc.
pub fn cone_bounds(view: &RectilinearView) -> ConeBounds {
    let corners = view.corner_rays();
    let frustum = view.frustum();

    let mut pitch_min = f64::INFINITY;
    let mut pitch_max = f64::NEG_INFINITY;
    let mut yaw = rectilinear::coordinates(corners[0]).0;
    let mut yaw_min = yaw;
    let mut yaw_max = yaw;

    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        let (_, pa) = rectilinear::coordinates(a);
        pitch_min = pitch_min.min(pa);
        pitch_max = pitch_max.max(pa);
        for p in arc_extremes(a, b) {
            let (_, pp) = rectilinear::coordinates(p);
            pitch_min = pitch_min.min(pp);
            pitch_max = pitch_max.max(pp);
        }
        if i + 1 < corners.len() {
            let (yb, _) = rectilinear::coordinates(b);
            yaw += util::wrap_angle(yb - yaw);
            yaw_min = yaw_min.min(yaw);
            yaw_max = yaw_max.max(yaw);
        }
    }

    let zenith = frustum.contains_direction(Vec3::Y);
    let nadir = frustum.contains_direction(-Vec3::Y);
    if zenith {
        pitch_min = -FRAC_PI_2;
    }
    if nadir {
        pitch_max = FRAC_PI_2;
    }
    if zenith || nadir {
        yaw_min = -PI;
        yaw_max = PI;
    }

    ConeBounds {
        yaw_min,
        yaw_max,
        pitch_min: pitch_min.max(-FRAC_PI_2),
        pitch_max: pitch_max.min(FRAC_PI_2),
    }
}

/// Highest and lowest points of the great-circle arc from `a` to `b`, when
/// they fall strictly inside it.
fn arc_extremes(a: Vec3, b: Vec3) -> Vec<Vec3> {
    let n = a.cross(b);
    if n.length() <= f64::EPSILON {
        return Vec::new();
    }
    let n = n.normalize();
    let top = Vec3::Y - n.scale(n.dot(Vec3::Y));
    if top.length() <= f64::EPSILON {
        return Vec::new();
    }
    let top = top.normalize();
    [top, -top]
        .into_iter()
        .filter(|p| a.cross(*p).dot(n) > 0.0 && p.cross(b).dot(n) > 0.0)
        .collect()
}

/// Angular spacing of the chords that trace a cell outline.
const OUTLINE_STEP: f64 = 1.0 / 32.0;

/// Whether the cell with normalized image extent `extent` shows inside
/// `frustum`. `centre` is the view direction as (yaw, pitch).
///
/// Parallels are traced by chords, which cut inside the true edge by at
/// most `OUTLINE_STEP² / 8`; the outline is widened by more than that so a
/// visible cell is never dropped.
fn cell_visible(frustum: &Frustum, centre: (f64, f64), extent: Aabb2) -> bool {
    let pad = OUTLINE_STEP * OUTLINE_STEP;
    let mut yaw0 = extent.min[0] * TAU - PI;
    let mut yaw1 = extent.max[0] * TAU - PI;
    if yaw1 - yaw0 < TAU {
        yaw0 -= pad;
        yaw1 += pad;
    }
    let pitch0 = (extent.min[1] * PI - FRAC_PI_2 - pad).max(-FRAC_PI_2);
    let pitch1 = (extent.max[1] * PI - FRAC_PI_2 + pad).min(FRAC_PI_2);

    let (yaw, pitch) = centre;
    let yaw_inside = (-1..=1).any(|k| {
        let y = yaw + f64::from(k) * TAU;
        yaw0 <= y && y <= yaw1
    });
    if yaw_inside && pitch0 <= pitch && pitch <= pitch1 {
        return true;
    }

    let mut outline = Vec::new();
    trace(&mut outline, (yaw0, pitch0), (yaw1, pitch0));
    trace(&mut outline, (yaw1, pitch0), (yaw1, pitch1));
    trace(&mut outline, (yaw1, pitch1), (yaw0, pitch1));
    trace(&mut outline, (yaw0, pitch1), (yaw0, pitch0));
    outline
        .iter()
        .zip(outline.iter().cycle().skip(1))
        .any(|(&a, &b)| chord_hits(frustum, a, b))
}

/// Appends rays along the straight yaw/pitch path from `from` towards `to`,
/// excluding `to` itself.
fn trace(out: &mut Vec<Vec3>, from: (f64, f64), to: (f64, f64)) {
    let span = (to.0 - from.0).abs().max((to.1 - from.1).abs());
    let steps = (span / OUTLINE_STEP).ceil().max(1.0) as u32;
    for i in 0..steps {
        let t = f64::from(i) / f64::from(steps);
        let yaw = util::tween(from.0, to.0, t);
        let pitch = util::tween(from.1, to.1, t);
        out.push(rectilinear::direction(yaw, pitch));
    }
}

/// Whether any point of the segment `a..b` lies inside `frustum`
/// (Liang-Barsky against each plane).
fn chord_hits(frustum: &Frustum, a: Vec3, b: Vec3) -> bool {
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for plane in frustum.planes() {
        let (da, db) = (plane.distance(a), plane.distance(b));
        if da < 0.0 && db < 0.0 {
            return false;
        }
        if da < 0.0 {
            t0 = t0.max(da / (da - db));
        } else if db < 0.0 {
            t1 = t1.min(da / (da - db));
        }
        if t0 > t1 {
            return false;
        }
    }
    true
}

impl EquirectGeometry {
    pub fn new(levels: &[EquirectLevelDesc]) -> Result<Self, GeometryError> {
        let levels = levels
            .iter()
            .map(|d| {
                let height = (d.width / 2).max(1);
                Level {
                    z: 0,
                    width: d.width,
                    height,
                    tile_width: d.tile_width.unwrap_or(d.width),
                    tile_height: d.tile_height.unwrap_or(height),
                    fallback_only: d.fallback_only,
                }
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

    /// Tiles of level `z` that cover part of the view cone, in row-major
    /// order.
    ///
    /// Candidates come from the cone's yaw/pitch bounding box; each is then
    /// kept only if its outline crosses the cone or it holds the view centre.
    pub fn visible_tiles(&self, view: &RectilinearView, z: u32, out: &mut Vec<Tile>) {
        let Some(level) = self.levels.get(z as usize) else {
            return;
        };
        let bounds = cone_bounds(view);
        let frustum = view.frustum();
        let (forward, _, _) = view.basis();
        let centre = rectilinear::coordinates(forward);
        let cells: BTreeSet<(u32, u32)> = bounds
            .image_regions()
            .iter()
            .flat_map(|region| level.tiles_overlapping(region))
            .map(|(x, y)| (y, x))
            .collect();
        out.extend(
            cells
                .into_iter()
                .filter(|&(y, x)| cell_visible(&frustum, centre, level.tile_extent(x, y)))
                .map(|(y, x)| Tile::grid(self.id, z, x, y)),
        );
    }

    /// Tile of level `z` at the given spherical coordinates.
    pub fn tile_at(&self, z: u32, yaw: f64, pitch: f64) -> Option<Tile> {
        let level = self.levels.get(z as usize)?;
        let u = (util::wrap_angle(yaw) + PI) / TAU;
        let v = (pitch + FRAC_PI_2) / PI;
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
    use super::{EquirectGeometry, cone_bounds};
    use crate::level::EquirectLevelDesc;
    use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;
    use view::{RectilinearParams, RectilinearView};

    fn view(yaw: f64, pitch: f64, fov: f64) -> RectilinearView {
        rolled(yaw, pitch, 0.0, fov)
    }

    fn rolled(yaw: f64, pitch: f64, roll: f64, fov: f64) -> RectilinearView {
        RectilinearView::new(RectilinearParams {
            yaw,
            pitch,
            roll,
            fov,
            width: 640.0,
            height: 480.0,
        })
    }

    fn tiled() -> EquirectGeometry {
        EquirectGeometry::new(&[
            EquirectLevelDesc::single(1024),
            EquirectLevelDesc {
                width: 4096,
                tile_width: Some(512),
                tile_height: Some(512),
                fallback_only: false,
            },
        ])
        .unwrap()
    }

    #[test]
    fn single_tile_level_is_always_visible() {
        let g = tiled();
        let mut out = Vec::new();
        g.visible_tiles(&view(1.0, 0.3, 1.0), 0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].x(), out[0].y()), (0, 0));
    }

    #[test]
    fn seam_view_wraps_around() {
        let g = tiled();
        let mut out = Vec::new();
        g.visible_tiles(&view(PI - 0.05, 0.0, 0.5), 1, &mut out);
        let cols: BTreeSet<u32> = out.iter().map(|t| t.x()).collect();
        assert!(cols.contains(&0));
        assert!(cols.contains(&7));
        assert!(!cols.contains(&4));
    }

    #[test]
    fn pole_opens_full_turn() {
        let b = cone_bounds(&view(0.0, -FRAC_PI_2, 1.0));
        assert!(b.wraps_fully());
        assert_eq!(b.pitch_min, -FRAC_PI_2);

        let b = cone_bounds(&view(0.3, 0.0, 1.0));
        assert!(!b.wraps_fully());
        assert!(b.yaw_min < 0.3 && 0.3 < b.yaw_max);
    }

    #[test]
    fn random_views_are_covered() {
        let g = tiled();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..60 {
            let v = rolled(
                rng.random_range(-PI..PI),
                rng.random_range(-1.5..1.5),
                rng.random_range(-PI..PI),
                rng.random_range(0.2..2.2),
            );
            let mut out = Vec::new();
            g.visible_tiles(&v, 1, &mut out);
            let tiles: BTreeSet<_> = out.into_iter().collect();
            for _ in 0..200 {
                let (yaw, pitch) = v
                    .screen_to_coordinates(
                        rng.random_range(0.5..639.5),
                        rng.random_range(0.5..479.5),
                    )
                    .unwrap();
                let tile = g.tile_at(1, yaw, pitch).unwrap();
                assert!(tiles.contains(&tile), "{tile} missing");
            }
        }
    }

    #[test]
    fn rolled_view_skips_box_corners() {
        let g = EquirectGeometry::new(&[EquirectLevelDesc {
            width: 8192,
            tile_width: Some(256),
            tile_height: Some(256),
            fallback_only: false,
        }])
        .unwrap();
        let v = rolled(0.0, 0.0, FRAC_PI_4, 1.0);
        let boxed: BTreeSet<(u32, u32)> = cone_bounds(&v)
            .image_regions()
            .iter()
            .flat_map(|region| g.levels[0].tiles_overlapping(region))
            .collect();
        let mut out = Vec::new();
        g.visible_tiles(&v, 0, &mut out);
        assert!(out.len() < boxed.len(), "{} of {}", out.len(), boxed.len());
        assert!(out.iter().all(|t| boxed.contains(&(t.x(), t.y()))));

        let tiles: BTreeSet<_> = out.into_iter().collect();
        for sx in 0..=32 {
            for sy in 0..=24 {
                let (yaw, pitch) = v
                    .screen_to_coordinates(1.0 + f64::from(sx) * 19.9, 1.0 + f64::from(sy) * 19.9)
                    .unwrap();
                let tile = g.tile_at(0, yaw, pitch).unwrap();
                assert!(tiles.contains(&tile), "{tile} missing");
            }
        }
    }

    #[test]
    fn children_cover_parent() {
        let g = tiled();
        let root = g.tile_at(0, 0.0, 0.0).unwrap();
        assert_eq!(g.children(&root).len(), 8 * 4);
        let child = g.tile_at(1, 2.0, -1.0).unwrap();
        assert_eq!(g.parent(&child), Some(root));
    }
}
