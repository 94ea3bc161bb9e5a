//! Camera models over panoramic media.
//!
//! A view owns its projection parameters, applies control offsets, and
//! notifies subscribers with [`ViewEvent`]s. Geometries read it to decide
//! which tiles are visible; renderers read it to project them.

pub mod flat;
pub mod frustum;
pub mod limit;
pub mod params;
pub mod rectilinear;

pub use flat::{FlatParams, FlatView};
pub use frustum::{Frustum, Plane};
pub use limit::{Limiter, compose};
pub use params::{ControlParameter, ControlParameters, UnknownParameter};
pub use rectilinear::{RectilinearParams, RectilinearView};

use runtime::Subscription;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Rectilinear,
    Flat,
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Rectilinear => f.write_str("rectilinear"),
            ViewKind::Flat => f.write_str("flat"),
        }
    }
}

/// Notifications fired by a view after an update.
///
/// `Change` fires whenever the limited, normalized parameters differ from
/// the previous ones; `Resize` additionally fires when the viewport size
/// changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    Change,
    Resize,
}

/// Pixel extent of one geometry level, as seen by level selection.
///
/// For spherical media this is the size of a 90° span; for flat media it is
/// the full image size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LevelExtent {
    pub width: f64,
    pub height: f64,
}

impl LevelExtent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Relative slack when comparing a level's resolution with the viewport,
/// so rounding in `tan` does not skip a level that matches exactly.
const LEVEL_SLACK: f64 = 1e-9;

pub(crate) fn resolves(available: f64, required: f64) -> bool {
    available >= required * (1.0 - LEVEL_SLACK)
}

/// Closed set of camera models.
#[derive(Debug)]
pub enum View {
    Rectilinear(RectilinearView),
    Flat(FlatView),
}

impl From<RectilinearView> for View {
    fn from(v: RectilinearView) -> Self {
        View::Rectilinear(v)
    }
}

impl From<FlatView> for View {
    fn from(v: FlatView) -> Self {
        View::Flat(v)
    }
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            View::Rectilinear(_) => ViewKind::Rectilinear,
            View::Flat(_) => ViewKind::Flat,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            View::Rectilinear(v) => v.width(),
            View::Flat(v) => v.width(),
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            View::Rectilinear(v) => v.height(),
            View::Flat(v) => v.height(),
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        match self {
            View::Rectilinear(v) => v.set_size(width, height),
            View::Flat(v) => v.set_size(width, height),
        }
    }

    pub fn update_with_control_parameters(&mut self, params: &ControlParameters) {
        match self {
            View::Rectilinear(v) => v.update_with_control_parameters(params),
            View::Flat(v) => v.update_with_control_parameters(params),
        }
    }

    pub fn select_level(&self, levels: &[LevelExtent], pixel_ratio: f64) -> Option<usize> {
        match self {
            View::Rectilinear(v) => v.select_level(levels, pixel_ratio),
            View::Flat(v) => v.select_level(levels, pixel_ratio),
        }
    }

    pub fn screen_to_coordinates(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            View::Rectilinear(v) => v.screen_to_coordinates(x, y),
            View::Flat(v) => v.screen_to_coordinates(x, y),
        }
    }

    pub fn coordinates_to_screen(&self, a: f64, b: f64) -> Option<(f64, f64)> {
        match self {
            View::Rectilinear(v) => v.coordinates_to_screen(a, b),
            View::Flat(v) => v.coordinates_to_screen(a, b),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewEvent) + 'static) -> Subscription {
        match self {
            View::Rectilinear(v) => v.subscribe(listener),
            View::Flat(v) => v.subscribe(listener),
        }
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        match self {
            View::Rectilinear(v) => v.unsubscribe(subscription),
            View::Flat(v) => v.unsubscribe(subscription),
        }
    }

    pub fn as_rectilinear(&self) -> Option<&RectilinearView> {
        match self {
            View::Rectilinear(v) => Some(v),
            View::Flat(_) => None,
        }
    }

    pub fn as_rectilinear_mut(&mut self) -> Option<&mut RectilinearView> {
        match self {
            View::Rectilinear(v) => Some(v),
            View::Flat(_) => None,
        }
    }

    pub fn as_flat(&self) -> Option<&FlatView> {
        match self {
            View::Flat(v) => Some(v),
            View::Rectilinear(_) => None,
        }
    }

    pub fn as_flat_mut(&mut self) -> Option<&mut FlatView> {
        match self {
            View::Flat(v) => Some(v),
            View::Rectilinear(_) => None,
        }
    }
}
