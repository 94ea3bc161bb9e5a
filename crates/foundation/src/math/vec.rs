/// Direction or point in the panorama frame.
///
/// Right-handed: `+y` is up, the camera at rest looks down `-z` and `+x`
/// is to its right.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

macro_rules! componentwise {
    ($trait:ident, $method:ident, $op:tt) => {
        impl std::ops::$trait for Vec3 {
            type Output = Vec3;

            fn $method(self, rhs: Vec3) -> Vec3 {
                Vec3::new(self.x $op rhs.x, self.y $op rhs.y, self.z $op rhs.z)
            }
        }
    };
}

componentwise!(Add, add, +);
componentwise!(Sub, sub, -);

impl std::ops::Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }
}

impl Vec3 {
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Vec3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn scale(self, k: f64) -> Vec3 {
        Vec3::new(k * self.x, k * self.y, k * self.z)
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(self) -> Vec3 {
        match self.length() {
            l if l > 0.0 => self.scale(l.recip()),
            _ => self,
        }
    }

    /// Point at `t` along the segment from `self` to `to`.
    pub fn lerp(self, to: Vec3, t: f64) -> Vec3 {
        self + (to - self).scale(t)
    }

    /// Chebyshev norm, used to project rays onto the unit cube.
    pub fn max_abs_component(self) -> f64 {
        [self.x, self.y, self.z]
            .into_iter()
            .fold(0.0, |m: f64, c| m.max(c.abs()))
    }
}
