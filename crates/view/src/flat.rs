use foundation::Aabb2;
use runtime::{Emitter, Subscription};
use serde::{Deserialize, Serialize};

use crate::limit::Limiter;
use crate::params::{ControlParameter, ControlParameters};
use crate::{LevelExtent, ViewEvent, resolves};

const ZOOM_EPSILON: f64 = 1e-6;

/// Parameters of a [`FlatView`].
///
/// `x`/`y` locate the viewport centre in normalized media coordinates
/// (`0..1` on both axes, `y` downwards); `zoom` is the fraction of the media
/// width visible across the viewport.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatParams {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    pub media_aspect_ratio: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for FlatParams {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            zoom: 1.0,
            media_aspect_ratio: 1.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

impl FlatParams {
    pub fn visible_width(&self) -> f64 {
        self.zoom
    }

    pub fn visible_height(&self) -> f64 {
        if self.width <= 0.0 || self.height <= 0.0 {
            return self.zoom;
        }
        self.zoom * self.media_aspect_ratio * self.height / self.width
    }

    pub fn visible_region(&self) -> Aabb2 {
        let hw = self.visible_width() / 2.0;
        let hh = self.visible_height() / 2.0;
        Aabb2::new([self.x - hw, self.y - hh], [self.x + hw, self.y + hh])
    }

    fn normalized(mut self) -> Self {
        self.zoom = self.zoom.max(ZOOM_EPSILON);
        if self.media_aspect_ratio.is_nan() || self.media_aspect_ratio <= 0.0 {
            self.media_aspect_ratio = 1.0;
        }
        self.width = self.width.max(0.0);
        self.height = self.height.max(0.0);
        self
    }
}

/// Orthographic camera over a flat image.
pub struct FlatView {
    params: FlatParams,
    limiter: Option<Limiter<FlatParams>>,
    emitter: Emitter<ViewEvent>,
}

impl std::fmt::Debug for FlatView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatView")
            .field("params", &self.params)
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

impl Default for FlatView {
    fn default() -> Self {
        Self::new(FlatParams::default())
    }
}

impl FlatView {
    pub fn new(params: FlatParams) -> Self {
        Self {
            params: params.normalized(),
            limiter: None,
            emitter: Emitter::new(),
        }
    }

    pub fn with_limiter(params: FlatParams, limiter: Limiter<FlatParams>) -> Self {
        let params = limiter(params).normalized();
        Self {
            params,
            limiter: Some(limiter),
            emitter: Emitter::new(),
        }
    }

    pub fn params(&self) -> FlatParams {
        self.params
    }

    pub fn x(&self) -> f64 {
        self.params.x
    }

    pub fn y(&self) -> f64 {
        self.params.y
    }

    pub fn zoom(&self) -> f64 {
        self.params.zoom
    }

    pub fn media_aspect_ratio(&self) -> f64 {
        self.params.media_aspect_ratio
    }

    pub fn width(&self) -> f64 {
        self.params.width
    }

    pub fn height(&self) -> f64 {
        self.params.height
    }

    pub fn visible_region(&self) -> Aabb2 {
        self.params.visible_region()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewEvent) + 'static) -> Subscription {
        self.emitter.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.emitter.unsubscribe(subscription)
    }

    pub fn set_limiter(&mut self, limiter: Option<Limiter<FlatParams>>) {
        self.limiter = limiter;
        self.apply(self.params);
    }

    pub fn set_parameters(&mut self, params: FlatParams) {
        self.apply(params);
    }

    pub fn set_x(&mut self, x: f64) {
        self.apply(FlatParams { x, ..self.params });
    }

    pub fn set_y(&mut self, y: f64) {
        self.apply(FlatParams { y, ..self.params });
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.apply(FlatParams { zoom, ..self.params });
    }

    pub fn set_media_aspect_ratio(&mut self, media_aspect_ratio: f64) {
        self.apply(FlatParams {
            media_aspect_ratio,
            ..self.params
        });
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.apply(FlatParams {
            width,
            height,
            ..self.params
        });
    }

    pub fn offset_x(&mut self, delta: f64) {
        self.set_x(self.params.x + delta);
    }

    pub fn offset_y(&mut self, delta: f64) {
        self.set_y(self.params.y + delta);
    }

    pub fn offset_zoom(&mut self, delta: f64) {
        self.set_zoom(self.params.zoom + delta);
    }

    pub fn update_with_control_parameters(&mut self, c: &ControlParameters) {
        let scale = self.params.zoom;
        let vw = self.params.visible_width();
        let vh = self.params.visible_height();
        let mut next = self.params;
        next.x += c.get(ControlParameter::AxisScaledX) * vw + c.get(ControlParameter::X) * scale;
        next.y += c.get(ControlParameter::AxisScaledY) * vh + c.get(ControlParameter::Y) * scale;
        next.zoom += c.get(ControlParameter::Zoom) * scale;
        self.apply(next);
    }

    fn apply(&mut self, requested: FlatParams) {
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

    /// Media coordinates under the viewport pixel `(x, y)`.
    pub fn screen_to_coordinates(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let FlatParams { width, height, .. } = self.params;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let region = self.visible_region();
        Some((
            region.min[0] + x / width * region.width(),
            region.min[1] + y / height * region.height(),
        ))
    }

    pub fn coordinates_to_screen(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let FlatParams { width, height, .. } = self.params;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let region = self.visible_region();
        Some((
            (x - region.min[0]) / region.width() * width,
            (y - region.min[1]) / region.height() * height,
        ))
    }

    /// Index of the lowest level with at least one media pixel per device
    /// pixel across the viewport, or the last one if none has.
    pub fn select_level(&self, levels: &[LevelExtent], pixel_ratio: f64) -> Option<usize> {
        let required = pixel_ratio * self.params.width;
        levels
            .iter()
            .position(|level| resolves(self.params.zoom * level.width, required))
            .or(levels.len().checked_sub(1))
    }
}

/// Ready-made limiters for [`FlatView`].
pub mod limiters {
    use super::FlatParams;
    use crate::limit::{Limiter, clamp_range};

    pub fn x(min: f64, max: f64) -> Limiter<FlatParams> {
        Box::new(move |p| FlatParams {
            x: clamp_range(p.x, min, max),
            ..p
        })
    }

    pub fn y(min: f64, max: f64) -> Limiter<FlatParams> {
        Box::new(move |p| FlatParams {
            y: clamp_range(p.y, min, max),
            ..p
        })
    }

    pub fn zoom(min: f64, max: f64) -> Limiter<FlatParams> {
        Box::new(move |p| FlatParams {
            zoom: clamp_range(p.zoom, min, max),
            ..p
        })
    }

    /// Stops zooming in past one media pixel per viewport pixel, for media
    /// `size` pixels wide.
    pub fn resolution(size: f64) -> Limiter<FlatParams> {
        Box::new(move |p| {
            if p.width <= 0.0 || size <= 0.0 {
                return p;
            }
            FlatParams {
                zoom: p.zoom.max(p.width / size),
                ..p
            }
        })
    }

    /// Keeps the visible region horizontally within `[min, max]`.
    pub fn visible_x(min: f64, max: f64) -> Limiter<FlatParams> {
        Box::new(move |p| {
            let half = p.visible_width() / 2.0;
            FlatParams {
                x: clamp_range(p.x, min + half, max - half),
                ..p
            }
        })
    }

    pub fn visible_y(min: f64, max: f64) -> Limiter<FlatParams> {
        Box::new(move |p| {
            let half = p.visible_height() / 2.0;
            FlatParams {
                y: clamp_range(p.y, min + half, max - half),
                ..p
            }
        })
    }

    /// Never zooms out further than needed to see the whole image, and
    /// keeps the image centred on any axis where it fits entirely.
    pub fn letterbox() -> Limiter<FlatParams> {
        Box::new(|p| {
            if p.width <= 0.0 || p.height <= 0.0 {
                return p;
            }
            let fit = (p.width / (p.height * p.media_aspect_ratio)).max(1.0);
            let p = FlatParams {
                zoom: p.zoom.min(fit),
                ..p
            };
            let hw = p.visible_width() / 2.0;
            let hh = p.visible_height() / 2.0;
            FlatParams {
                x: clamp_range(p.x, hw, 1.0 - hw),
                y: clamp_range(p.y, hh, 1.0 - hh),
                ..p
            }
        })
    }
}
