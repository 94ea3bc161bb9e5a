use foundation::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub n: Vec3,
    pub d: f64,
}

impl Plane {
    pub fn new(n: Vec3, d: f64) -> Self {
        Self { n, d }
    }

    /// Plane through the origin.
    pub fn through_origin(n: Vec3) -> Self {
        Self::new(n, 0.0)
    }

    pub fn normalize(self) -> Self {
        let l = self.n.length();
        if l <= 0.0 {
            return self;
        }
        Self {
            n: self.n.scale(1.0 / l),
            d: self.d / l,
        }
    }

    pub fn distance(&self, p: Vec3) -> f64 {
        self.n.dot(p) + self.d
    }
}

/// Viewing cone of a rectilinear camera, as planes through the eye.
///
/// Convention:
/// - A point `p` is inside iff `plane.distance(p) >= 0` for all planes.
/// - `near` is the half-space in front of the eye; the cone is always
///   narrower than a hemisphere, so it never clips anything the side planes
///   keep, but it rejects the mirrored cone behind the camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    pub left: Plane,
    pub right: Plane,
    pub bottom: Plane,
    pub top: Plane,
    pub near: Plane,
}

/// Polygons whose clipped area falls below this are treated as touching the
/// cone only along an edge.
const MIN_CLIPPED_AREA: f64 = 1e-12;

impl Frustum {
    /// Builds the cone spanned by the four corner rays of the viewport.
    ///
    /// `tan_x`/`tan_y` are the tangents of the half-apertures.
    pub fn from_basis(forward: Vec3, right: Vec3, up: Vec3, tan_x: f64, tan_y: f64) -> Self {
        let rx = right.scale(tan_x);
        let uy = up.scale(tan_y);
        let tl = forward - rx + uy;
        let tr = forward + rx + uy;
        let br = forward + rx - uy;
        let bl = forward - rx - uy;

        let side = |a: Vec3, b: Vec3| {
            let n = a.cross(b);
            let n = if n.dot(forward) < 0.0 { -n } else { n };
            Plane::through_origin(n).normalize()
        };

        Self {
            left: side(bl, tl),
            right: side(tr, br),
            bottom: side(br, bl),
            top: side(tl, tr),
            near: Plane::through_origin(forward).normalize(),
        }
    }

    pub fn planes(&self) -> [Plane; 5] {
        [self.left, self.right, self.bottom, self.top, self.near]
    }

    pub fn contains_direction(&self, v: Vec3) -> bool {
        self.planes().iter().all(|p| p.distance(v) >= 0.0)
    }

    /// Clips a convex polygon against the cone (Sutherland–Hodgman).
    pub fn clip_polygon(&self, polygon: &[Vec3]) -> Vec<Vec3> {
        let mut current = polygon.to_vec();
        for plane in self.planes() {
            if current.is_empty() {
                break;
            }
            current = clip_against(&current, &plane);
        }
        current
    }

    /// Whether any region of positive area of the convex polygon lies inside
    /// the cone.
    pub fn intersects_polygon(&self, polygon: &[Vec3]) -> bool {
        let clipped = self.clip_polygon(polygon);
        clipped.len() >= 3 && polygon_area(&clipped) > MIN_CLIPPED_AREA
    }
}

fn clip_against(polygon: &[Vec3], plane: &Plane) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    let Some(&last) = polygon.last() else {
        return out;
    };
    let mut prev = last;
    let mut prev_d = plane.distance(prev);
    for &cur in polygon {
        let cur_d = plane.distance(cur);
        let cur_in = cur_d >= 0.0;
        let prev_in = prev_d >= 0.0;
        if cur_in != prev_in {
            let t = prev_d / (prev_d - cur_d);
            out.push(prev.lerp(cur, t));
        }
        if cur_in {
            out.push(cur);
        }
        prev = cur;
        prev_d = cur_d;
    }
    out
}

fn polygon_area(polygon: &[Vec3]) -> f64 {
    let mut acc = Vec3::new(0.0, 0.0, 0.0);
    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        acc = acc + a.cross(b);
    }
    0.5 * acc.length()
}

#[cfg(test)]
mod tests {
    use super::Frustum;
    use foundation::math::Vec3;

    fn forward_frustum() -> Frustum {
        // Looking down -z with a 90° square aperture.
        Frustum::from_basis(
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::X,
            Vec3::Y,
            1.0,
            1.0,
        )
    }

    #[test]
    fn contains_forward_and_rejects_backward() {
        let f = forward_frustum();
        assert!(f.contains_direction(Vec3::new(0.0, 0.0, -1.0)));
        assert!(f.contains_direction(Vec3::new(0.5, -0.5, -1.0)));
        assert!(!f.contains_direction(Vec3::new(0.0, 0.0, 1.0)));
        assert!(!f.contains_direction(Vec3::new(2.0, 0.0, -1.0)));
    }

    #[test]
    fn quad_straddling_the_edge_is_clipped() {
        let f = forward_frustum();
        let quad = [
            Vec3::new(0.5, -0.25, -1.0),
            Vec3::new(1.5, -0.25, -1.0),
            Vec3::new(1.5, 0.25, -1.0),
            Vec3::new(0.5, 0.25, -1.0),
        ];
        let clipped = f.clip_polygon(&quad);
        assert!(f.intersects_polygon(&quad));
        for p in clipped {
            assert!(p.x <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn quad_touching_only_an_edge_is_outside() {
        let f = forward_frustum();
        let quad = [
            Vec3::new(1.0, -0.25, -1.0),
            Vec3::new(2.0, -0.25, -1.0),
            Vec3::new(2.0, 0.25, -1.0),
            Vec3::new(1.0, 0.25, -1.0),
        ];
        assert!(!f.intersects_polygon(&quad));
    }

    #[test]
    fn quad_behind_the_eye_is_outside() {
        let f = forward_frustum();
        let quad = [
            Vec3::new(-0.5, -0.5, 1.0),
            Vec3::new(0.5, -0.5, 1.0),
            Vec3::new(0.5, 0.5, 1.0),
            Vec3::new(-0.5, 0.5, 1.0),
        ];
        assert!(!f.intersects_polygon(&quad));
    }
}
