use std::collections::BTreeMap;

use runtime::EventBus;
use view::ControlParameter;

use crate::dynamics::Dynamics;
use crate::method::{ControlEvent, ControlMethod, Input, InputContext};

pub const DEFAULT_ZOOM_DELTA: f64 = 0.001;

/// Zooms by wheel steps; each step is a complete interaction.
#[derive(Debug, Clone)]
pub struct ScrollZoomControlMethod {
    zoom_delta: f64,
}

impl Default for ScrollZoomControlMethod {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_DELTA)
    }
}

impl ScrollZoomControlMethod {
    /// `zoom_delta` is the zoom offset per pixel of wheel travel.
    pub fn new(zoom_delta: f64) -> Self {
        Self { zoom_delta }
    }
}

impl ControlMethod for ScrollZoomControlMethod {
    fn handle(&mut self, input: &Input, _ctx: &InputContext, out: &mut EventBus<ControlEvent>) {
        if let Input::Wheel { delta } = *input
            && delta != 0.0
        {
            out.emit(ControlEvent::Active);
            out.emit(ControlEvent::dynamics(
                ControlParameter::Zoom,
                Dynamics::offset(delta * self.zoom_delta),
            ));
            out.emit(ControlEvent::Inactive);
        }
    }

    fn reset(&mut self, _out: &mut EventBus<ControlEvent>) {}
}

/// Two-finger pinch. Spreading the fingers zooms in.
#[derive(Debug, Clone, Default)]
pub struct PinchZoomControlMethod {
    pointers: BTreeMap<u32, (f64, f64)>,
    last_distance: Option<f64>,
}

impl PinchZoomControlMethod {
    pub fn new() -> Self {
        Self::default()
    }

    fn distance(&self) -> Option<f64> {
        let mut it = self.pointers.values();
        let (a, b) = (it.next()?, it.next()?);
        Some((a.0 - b.0).hypot(a.1 - b.1))
    }
}

impl ControlMethod for PinchZoomControlMethod {
    fn handle(&mut self, input: &Input, _ctx: &InputContext, out: &mut EventBus<ControlEvent>) {
        match *input {
            Input::PointerDown { pointer, x, y } if self.pointers.len() < 2 => {
                self.pointers.insert(pointer, (x, y));
                if self.pointers.len() == 2 {
                    self.last_distance = self.distance();
                    out.emit(ControlEvent::Active);
                }
            }
            Input::PointerMove { pointer, x, y } => {
                let Some(pos) = self.pointers.get_mut(&pointer) else {
                    return;
                };
                *pos = (x, y);
                if let (Some(last), Some(now)) = (self.last_distance, self.distance())
                    && now > 0.0
                {
                    out.emit(ControlEvent::dynamics(
                        ControlParameter::Zoom,
                        Dynamics::offset(last / now - 1.0),
                    ));
                    self.last_distance = Some(now);
                }
            }
            Input::PointerUp { pointer } => {
                let pinching = self.pointers.len() == 2;
                if self.pointers.remove(&pointer).is_some() && pinching {
                    self.last_distance = None;
                    out.emit(ControlEvent::Inactive);
                }
            }
            _ => {}
        }
    }

    fn reset(&mut self, out: &mut EventBus<ControlEvent>) {
        let pinching = self.pointers.len() == 2;
        self.pointers.clear();
        self.last_distance = None;
        if pinching {
            out.emit(ControlEvent::Inactive);
        }
    }
}
