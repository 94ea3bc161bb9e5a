use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use foundation::math::Vec3;
use foundation::util::{self, fov};
use runtime::{Emitter, Subscription};
use serde::{Deserialize, Serialize};

use crate::frustum::Frustum;
use crate::limit::Limiter;
use crate::params::{ControlParameter, ControlParameters};
use crate::{LevelExtent, ViewEvent, resolves};

const FOV_EPSILON: f64 = 1e-6;

/// Unit view direction for spherical coordinates.
///
/// Yaw is measured clockwise from `-z` when seen from above, pitch is
/// positive below the horizon.
pub fn direction(yaw: f64, pitch: f64) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(sy * cp, -sp, -cy * cp)
}

/// Inverse of [`direction`]; `v` need not be normalized.
pub fn coordinates(v: Vec3) -> (f64, f64) {
    let yaw = v.x.atan2(-v.z);
    let pitch = (-v.y).atan2(v.x.hypot(v.z));
    (yaw, pitch)
}

/// Parameters of a [`RectilinearView`]. Angles are radians; `fov` is the
/// vertical aperture.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectilinearParams {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub fov: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for RectilinearParams {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov: FRAC_PI_4,
            width: 0.0,
            height: 0.0,
        }
    }
}

impl RectilinearParams {
    pub fn hfov(&self) -> f64 {
        fov::vtoh(self.fov, self.width, self.height)
    }

    fn normalized(mut self) -> Self {
        self.yaw = util::wrap_angle(self.yaw);
        self.pitch = util::wrap_angle(self.pitch);
        self.roll = util::wrap_angle(self.roll);
        self.fov = util::clamp(self.fov, FOV_EPSILON, PI - FOV_EPSILON);
        self.width = self.width.max(0.0);
        self.height = self.height.max(0.0);
        self
    }
}

/// Perspective camera at the centre of a sphere.
pub struct RectilinearView {
    params: RectilinearParams,
    limiter: Option<Limiter<RectilinearParams>>,
    emitter: Emitter<ViewEvent>,
}

impl std::fmt::Debug for RectilinearView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RectilinearView")
            .field("params", &self.params)
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

impl Default for RectilinearView {
    fn default() -> Self {
        Self::new(RectilinearParams::default())
    }
}

impl RectilinearView {
    pub fn new(params: RectilinearParams) -> Self {
        Self {
            params: params.normalized(),
            limiter: None,
            emitter: Emitter::new(),
        }
    }

    pub fn with_limiter(params: RectilinearParams, limiter: Limiter<RectilinearParams>) -> Self {
        let params = limiter(params).normalized();
        Self {
            params,
            limiter: Some(limiter),
            emitter: Emitter::new(),
        }
    }

    pub fn params(&self) -> RectilinearParams {
        self.params
    }

    pub fn yaw(&self) -> f64 {
        self.params.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.params.pitch
    }

    pub fn roll(&self) -> f64 {
        self.params.roll
    }

    pub fn fov(&self) -> f64 {
        self.params.fov
    }

    pub fn hfov(&self) -> f64 {
        self.params.hfov()
    }

    pub fn width(&self) -> f64 {
        self.params.width
    }

    pub fn height(&self) -> f64 {
        self.params.height
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewEvent) + 'static) -> Subscription {
        self.emitter.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.emitter.unsubscribe(subscription)
    }

    /// Replaces the limiter and re-applies it to the current parameters.
    pub fn set_limiter(&mut self, limiter: Option<Limiter<RectilinearParams>>) {
        self.limiter = limiter;
        self.apply(self.params);
    }

    pub fn set_parameters(&mut self, params: RectilinearParams) {
        self.apply(params);
    }

    pub fn set_yaw(&mut self, yaw: f64) {
        self.apply(RectilinearParams { yaw, ..self.params });
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.apply(RectilinearParams {
            pitch,
            ..self.params
        });
    }

    pub fn set_roll(&mut self, roll: f64) {
        self.apply(RectilinearParams { roll, ..self.params });
    }

    pub fn set_fov(&mut self, fov: f64) {
        self.apply(RectilinearParams { fov, ..self.params });
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.apply(RectilinearParams {
            width,
            height,
            ..self.params
        });
    }

    pub fn offset_yaw(&mut self, delta: f64) {
        self.set_yaw(self.params.yaw + delta);
    }

    pub fn offset_pitch(&mut self, delta: f64) {
        self.set_pitch(self.params.pitch + delta);
    }

    pub fn offset_roll(&mut self, delta: f64) {
        self.set_roll(self.params.roll + delta);
    }

    pub fn offset_fov(&mut self, delta: f64) {
        self.set_fov(self.params.fov + delta);
    }

    /// Applies one tick of accumulated control offsets as a single update.
    pub fn update_with_control_parameters(&mut self, c: &ControlParameters) {
        let vfov = self.params.fov;
        let hfov = self.params.hfov();
        let mut next = self.params;
        next.yaw += c.get(ControlParameter::AxisScaledX) * hfov
            + c.get(ControlParameter::X) * 2.0 * hfov
            + c.get(ControlParameter::Yaw);
        next.pitch += c.get(ControlParameter::AxisScaledY) * vfov
            + c.get(ControlParameter::Y) * 2.0 * hfov
            + c.get(ControlParameter::Pitch);
        next.roll -= c.get(ControlParameter::Roll);
        next.fov += c.get(ControlParameter::Zoom) * vfov;
        self.apply(next);
    }

    fn apply(&mut self, requested: RectilinearParams) {
        let limited = match &self.limiter {
            Some(limit) => limit(requested),
            None => requested,
        };
        let next = limited.normalized();
        let prev = std::mem::replace(&mut self.params, next);
        if prev == next {
            return;
        }
        self.emitter.emit(&ViewEvent::Change);
        if prev.width != next.width || prev.height != next.height {
            self.emitter.emit(&ViewEvent::Resize);
        }
    }

    /// Camera basis `(forward, right, up)`.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let (sy, cy) = self.params.yaw.sin_cos();
        let forward = direction(self.params.yaw, self.params.pitch);
        let right = Vec3::new(cy, 0.0, sy);
        let up = right.cross(forward);
        let (sr, cr) = self.params.roll.sin_cos();
        (
            forward,
            right.scale(cr) + up.scale(sr),
            up.scale(cr) - right.scale(sr),
        )
    }

    fn half_tangents(&self) -> (f64, f64) {
        ((self.hfov() / 2.0).tan(), (self.params.fov / 2.0).tan())
    }

    pub fn frustum(&self) -> Frustum {
        let (forward, right, up) = self.basis();
        let (tx, ty) = self.half_tangents();
        Frustum::from_basis(forward, right, up, tx, ty)
    }

    /// Rays through the viewport corners, clockwise from the top-left.
    pub fn corner_rays(&self) -> [Vec3; 4] {
        let (forward, right, up) = self.basis();
        let (tx, ty) = self.half_tangents();
        let rx = right.scale(tx);
        let uy = up.scale(ty);
        [
            forward - rx + uy,
            forward + rx + uy,
            forward + rx - uy,
            forward - rx - uy,
        ]
    }

    /// Spherical coordinates seen through the viewport pixel `(x, y)`,
    /// measured from the top-left corner. `None` for an empty viewport.
    pub fn screen_to_coordinates(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let RectilinearParams { width, height, .. } = self.params;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let ndc_x = x / width * 2.0 - 1.0;
        let ndc_y = 1.0 - y / height * 2.0;
        let (forward, right, up) = self.basis();
        let (tx, ty) = self.half_tangents();
        let ray = forward + right.scale(ndc_x * tx) + up.scale(ndc_y * ty);
        Some(coordinates(ray))
    }

    /// Viewport pixel where `(yaw, pitch)` projects. `None` when the point
    /// is behind the camera or the viewport is empty; points outside the
    /// viewport still project.
    pub fn coordinates_to_screen(&self, yaw: f64, pitch: f64) -> Option<(f64, f64)> {
        let RectilinearParams { width, height, .. } = self.params;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let (forward, right, up) = self.basis();
        let d = direction(yaw, pitch);
        let depth = d.dot(forward);
        if depth <= 0.0 {
            return None;
        }
        let (tx, ty) = self.half_tangents();
        let ndc_x = d.dot(right) / depth / tx;
        let ndc_y = d.dot(up) / depth / ty;
        Some(((ndc_x + 1.0) / 2.0 * width, (1.0 - ndc_y) / 2.0 * height))
    }

    /// Index of the lowest level dense enough for the viewport, or the last
    /// one if none is. `None` only for an empty list.
    pub fn select_level(&self, levels: &[LevelExtent], pixel_ratio: f64) -> Option<usize> {
        let required = pixel_ratio * self.params.height;
        let cover = (self.params.fov / 2.0).tan();
        levels
            .iter()
            .position(|level| resolves(cover * level.height, required))
            .or(levels.len().checked_sub(1))
    }
}

/// Ready-made limiters for [`RectilinearView`].
pub mod limiters {
    use super::{FRAC_PI_2, RectilinearParams};
    use crate::limit::{Limiter, clamp_range, compose};
    use foundation::util::fov;

    pub fn yaw(min: f64, max: f64) -> Limiter<RectilinearParams> {
        Box::new(move |p| RectilinearParams {
            yaw: clamp_range(p.yaw, min, max),
            ..p
        })
    }

    pub fn pitch(min: f64, max: f64) -> Limiter<RectilinearParams> {
        Box::new(move |p| RectilinearParams {
            pitch: clamp_range(p.pitch, min, max),
            ..p
        })
    }

    pub fn roll(min: f64, max: f64) -> Limiter<RectilinearParams> {
        Box::new(move |p| RectilinearParams {
            roll: clamp_range(p.roll, min, max),
            ..p
        })
    }

    pub fn vfov(min: f64, max: f64) -> Limiter<RectilinearParams> {
        Box::new(move |p| RectilinearParams {
            fov: clamp_range(p.fov, min, max),
            ..p
        })
    }

    /// Bounds the horizontal aperture for the current viewport shape.
    pub fn hfov(min: f64, max: f64) -> Limiter<RectilinearParams> {
        Box::new(move |p| {
            if p.width <= 0.0 || p.height <= 0.0 {
                return p;
            }
            let min_v = fov::htov(min, p.width, p.height);
            let max_v = fov::htov(max, p.width, p.height);
            RectilinearParams {
                fov: clamp_range(p.fov, min_v, max_v),
                ..p
            }
        })
    }

    /// Stops zooming in past one media pixel per viewport pixel, for media
    /// whose 90° span is `size` pixels.
    pub fn resolution(size: f64) -> Limiter<RectilinearParams> {
        Box::new(move |p| {
            if p.height <= 0.0 || size <= 0.0 {
                return p;
            }
            let min_fov = 2.0 * (p.height / size).atan();
            RectilinearParams {
                fov: p.fov.max(min_fov),
                ..p
            }
        })
    }

    /// Resolution cap, aperture cap and no looking past the poles.
    pub fn traditional(max_resolution: f64, max_fov: f64) -> Limiter<RectilinearParams> {
        compose(vec![
            resolution(max_resolution),
            vfov(0.0, max_fov),
            hfov(0.0, max_fov),
            pitch(-FRAC_PI_2, FRAC_PI_2),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::{RectilinearParams, RectilinearView, coordinates, direction, limiters};
    use crate::{ControlParameter, ControlParameters, LevelExtent, ViewEvent};
    use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {b}, got {a}");
    }

    fn sized(width: f64, height: f64) -> RectilinearView {
        RectilinearView::new(RectilinearParams {
            width,
            height,
            ..RectilinearParams::default()
        })
    }

    fn record(view: &mut RectilinearView) -> Rc<RefCell<Vec<ViewEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        view.subscribe(move |e| l.borrow_mut().push(*e));
        log
    }

    #[test]
    fn direction_follows_axis_conventions() {
        let d = direction(0.0, 0.0);
        assert_close(d.z, -1.0, 1e-12);
        let right = direction(FRAC_PI_2, 0.0);
        assert_close(right.x, 1.0, 1e-12);
        let down = direction(0.0, FRAC_PI_2);
        assert_close(down.y, -1.0, 1e-12);

        let (yaw, pitch) = coordinates(direction(0.3, -0.2));
        assert_close(yaw, 0.3, 1e-12);
        assert_close(pitch, -0.2, 1e-12);
    }

    #[test]
    fn change_fires_only_on_actual_change() {
        let mut view = sized(100.0, 100.0);
        let log = record(&mut view);

        view.set_yaw(0.0);
        assert!(log.borrow().is_empty());

        view.set_yaw(0.5);
        assert_eq!(*log.borrow(), vec![ViewEvent::Change]);
    }

    #[test]
    fn resize_fires_with_change() {
        let mut view = sized(100.0, 100.0);
        let log = record(&mut view);
        view.set_size(200.0, 100.0);
        assert_eq!(*log.borrow(), vec![ViewEvent::Change, ViewEvent::Resize]);
        view.set_size(200.0, 100.0);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn yaw_wraps_and_fov_is_clamped() {
        let mut view = sized(100.0, 100.0);
        view.set_yaw(2.0 * PI + 0.25);
        assert_close(view.yaw(), 0.25, 1e-12);
        view.set_fov(4.0);
        assert!(view.fov() < PI);
        view.set_fov(-1.0);
        assert!(view.fov() > 0.0);
    }

    #[test]
    fn limiter_constrains_updates() {
        let mut view = RectilinearView::with_limiter(
            RectilinearParams {
                width: 100.0,
                height: 100.0,
                ..RectilinearParams::default()
            },
            limiters::pitch(-0.5, 0.5),
        );
        view.set_pitch(1.2);
        assert_close(view.pitch(), 0.5, 1e-12);
    }

    #[test]
    fn control_parameters_scale_by_fov() {
        let mut view = sized(100.0, 100.0);
        let hfov = view.hfov();
        let params = ControlParameters::new()
            .with(ControlParameter::AxisScaledX, 0.5)
            .with(ControlParameter::Yaw, 0.1);
        view.update_with_control_parameters(&params);
        assert_close(view.yaw(), 0.5 * hfov + 0.1, 1e-12);

        let zoom = ControlParameters::new().with(ControlParameter::Zoom, 0.5);
        view.update_with_control_parameters(&zoom);
        assert_close(view.fov(), FRAC_PI_4 * 1.5, 1e-12);
    }

    #[test]
    fn screen_round_trip() {
        let mut view = sized(800.0, 600.0);
        view.set_parameters(RectilinearParams {
            yaw: 0.7,
            pitch: -0.3,
            roll: 0.1,
            fov: 1.0,
            width: 800.0,
            height: 600.0,
        });
        let (yaw, pitch) = view.screen_to_coordinates(400.0, 300.0).unwrap();
        assert_close(yaw, 0.7, 1e-9);
        assert_close(pitch, -0.3, 1e-9);

        let (yaw, pitch) = view.screen_to_coordinates(120.0, 480.0).unwrap();
        let (x, y) = view.coordinates_to_screen(yaw, pitch).unwrap();
        assert_close(x, 120.0, 1e-6);
        assert_close(y, 480.0, 1e-6);

        assert!(view.coordinates_to_screen(0.7 + PI, 0.3).is_none());
    }

    #[test]
    fn screen_round_trip_under_random_cameras() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let width = rng.random_range(100.0..1600.0);
            let height = rng.random_range(100.0..1200.0);
            let view = RectilinearView::new(RectilinearParams {
                yaw: rng.random_range(-PI..PI),
                pitch: rng.random_range(-1.2..1.2),
                roll: rng.random_range(-PI..PI),
                fov: rng.random_range(0.2..2.0),
                width,
                height,
            });
            for _ in 0..10 {
                let x = rng.random_range(0.0..width);
                let y = rng.random_range(0.0..height);
                let (yaw, pitch) = view.screen_to_coordinates(x, y).unwrap();
                let (sx, sy) = view.coordinates_to_screen(yaw, pitch).unwrap();
                assert_close(sx, x, 1e-6);
                assert_close(sy, y, 1e-6);
            }
        }
    }

    #[test]
    fn frustum_contains_viewport_rays() {
        let mut view = sized(640.0, 480.0);
        view.set_yaw(1.0);
        view.set_pitch(0.4);
        let frustum = view.frustum();
        for (x, y) in [(1.0, 1.0), (639.0, 1.0), (320.0, 240.0), (1.0, 479.0)] {
            let (yaw, pitch) = view.screen_to_coordinates(x, y).unwrap();
            assert!(frustum.contains_direction(super::direction(yaw, pitch)));
        }
        assert!(!frustum.contains_direction(super::direction(1.0 + PI, 0.0)));
    }

    #[test]
    fn selects_lowest_sufficient_level() {
        let mut view = sized(512.0, 512.0);
        view.set_fov(FRAC_PI_2);
        let levels = [
            LevelExtent::new(256.0, 256.0),
            LevelExtent::new(512.0, 512.0),
            LevelExtent::new(1024.0, 1024.0),
        ];
        assert_eq!(view.select_level(&levels, 1.0), Some(1));
        assert_eq!(view.select_level(&levels, 4.0), Some(2));
        assert_eq!(view.select_level(&[], 1.0), None);
    }
}
