use core::cmp::Ordering;

use foundation::next_serial;
use foundation::math::Vec3;
use foundation::util;
use serde::{Deserialize, Serialize};

/// Identity of one geometry instance; tiles never compare across ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GeometryId(u64);

impl GeometryId {
    pub fn next() -> Self {
        GeometryId(next_serial())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GeometryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "geometry#{}", self.0)
    }
}

/// Cube face, in paint order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Face {
    F,
    R,
    B,
    L,
    U,
    D,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::F, Face::R, Face::B, Face::L, Face::U, Face::D];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn as_char(self) -> char {
        match self {
            Face::F => 'f',
            Face::R => 'r',
            Face::B => 'b',
            Face::L => 'l',
            Face::U => 'u',
            Face::D => 'd',
        }
    }

    /// `(normal, right, up)` of the face image as seen from the centre.
    ///
    /// A point with face coordinates `(s, t)`, both in `[-0.5, 0.5]`, is
    /// `0.5 * normal + s * right + t * up`.
    pub fn basis(self) -> (Vec3, Vec3, Vec3) {
        let x = Vec3::X;
        let y = Vec3::Y;
        let z = Vec3::Z;
        match self {
            Face::F => (-z, x, y),
            Face::R => (x, z, y),
            Face::B => (z, -x, y),
            Face::L => (-x, -z, y),
            Face::U => (y, x, z),
            Face::D => (-y, x, -z),
        }
    }

    /// Face hit by a ray, and the ray's `(s, t)` coordinates on it.
    pub fn project(v: Vec3) -> Option<(Face, f64, f64)> {
        if v.max_abs_component() <= 0.0 {
            return None;
        }
        let face = Face::ALL
            .into_iter()
            .max_by(|a, b| util::cmp(a.basis().0.dot(v), b.basis().0.dot(v)))?;
        let (n, u, w) = face.basis();
        let p = v.scale(0.5 / n.dot(v));
        Some((face, p.dot(u), p.dot(w)))
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Geometry-specific position of a tile within its level.
///
/// Rows (`y`) grow downwards in image space, columns (`x`) grow rightwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TileAddress {
    Cube { face: Face, x: u32, y: u32 },
    Grid { x: u32, y: u32 },
}

/// Value-like handle for one tile of one geometry level.
///
/// Equality and hashing are structural over `(geometry, z, address)`; the
/// order sorts lower levels first so that when tiles of several levels
/// cover the same spot, finer ones are painted on top.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Tile {
    pub geometry: GeometryId,
    pub z: u32,
    pub address: TileAddress,
}

impl Tile {
    pub fn cube(geometry: GeometryId, z: u32, face: Face, x: u32, y: u32) -> Self {
        Self {
            geometry,
            z,
            address: TileAddress::Cube { face, x, y },
        }
    }

    pub fn grid(geometry: GeometryId, z: u32, x: u32, y: u32) -> Self {
        Self {
            geometry,
            z,
            address: TileAddress::Grid { x, y },
        }
    }

    pub fn face(&self) -> Option<Face> {
        match self.address {
            TileAddress::Cube { face, .. } => Some(face),
            TileAddress::Grid { .. } => None,
        }
    }

    pub fn x(&self) -> u32 {
        match self.address {
            TileAddress::Cube { x, .. } | TileAddress::Grid { x, .. } => x,
        }
    }

    pub fn y(&self) -> u32 {
        match self.address {
            TileAddress::Cube { y, .. } | TileAddress::Grid { y, .. } => y,
        }
    }

    fn sort_key(&self) -> (GeometryId, u32, u32, u32, u32) {
        let face = self.face().map_or(0, Face::index);
        (self.geometry, self.z, face, self.y(), self.x())
    }

    /// Stable 32-bit hash, identical across runs and platforms.
    ///
    /// Equal tiles always hash equal; distinct tiles may collide.
    pub fn hash_value(&self) -> u32 {
        let g = self.geometry.get();
        let face = self.face().map_or(u32::MAX, Face::index);
        util::hash(&[
            g as u32,
            (g >> 32) as u32,
            self.z,
            face,
            self.x(),
            self.y(),
        ])
    }

    pub fn equals(&self, other: &Tile) -> bool {
        self == other
    }
}

impl Ord for Tile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Tile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.address {
            TileAddress::Cube { face, x, y } => write!(f, "{face}/{}/{x}/{y}", self.z),
            TileAddress::Grid { x, y } => write!(f, "{}/{x}/{y}", self.z),
        }
    }
}
