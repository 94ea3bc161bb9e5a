use std::collections::VecDeque;

use foundation::Time;
use runtime::EventBus;
use view::ControlParameter;

use crate::dynamics::Dynamics;
use crate::method::{ControlEvent, ControlMethod, Input, InputContext};

/// Maximum samples to keep for release velocity estimation.
const VELOCITY_HISTORY_SIZE: usize = 5;

/// Only movement this recent counts towards the release velocity, so a
/// pointer that stops before lifting does not fling the view.
const VELOCITY_WINDOW_S: f64 = 0.1;

pub const DEFAULT_DRAG_FRICTION: f64 = 0.95;

#[derive(Debug, Clone, Copy)]
struct VelocitySample {
    dx: f64,
    dy: f64,
    dt: f64,
    at: Time,
}

/// Grab-and-move panning: the media follows the pointer, then coasts.
///
/// Drives `axisScaledX`/`axisScaledY` in fractions of the element size.
#[derive(Debug, Clone)]
pub struct DragControlMethod {
    friction: f64,
    pointer: Option<u32>,
    last_pos: (f64, f64),
    last_time: Time,
    history: VecDeque<VelocitySample>,
}

impl Default for DragControlMethod {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_FRICTION)
    }
}

impl DragControlMethod {
    pub fn new(friction: f64) -> Self {
        Self {
            friction,
            pointer: None,
            last_pos: (0.0, 0.0),
            last_time: Time::ZERO,
            history: VecDeque::with_capacity(VELOCITY_HISTORY_SIZE),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer.is_some()
    }

    /// Pixels per second over the recent samples.
    fn estimate_velocity(&self, now: Time) -> (f64, f64) {
        let (mut dx, mut dy, mut dt) = (0.0, 0.0, 0.0);
        for s in self
            .history
            .iter()
            .filter(|s| now.since(s.at) <= VELOCITY_WINDOW_S)
        {
            dx += s.dx;
            dy += s.dy;
            dt += s.dt;
        }
        if dt <= 0.0 {
            return (0.0, 0.0);
        }
        (dx / dt, dy / dt)
    }

    fn emit(&self, out: &mut EventBus<ControlEvent>, x: Dynamics, y: Dynamics) {
        out.emit(ControlEvent::dynamics(ControlParameter::AxisScaledX, x));
        out.emit(ControlEvent::dynamics(ControlParameter::AxisScaledY, y));
    }
}

impl ControlMethod for DragControlMethod {
    fn handle(&mut self, input: &Input, ctx: &InputContext, out: &mut EventBus<ControlEvent>) {
        let w = ctx.width.max(1.0);
        let h = ctx.height.max(1.0);
        match *input {
            Input::PointerDown { pointer, x, y } if self.pointer.is_none() => {
                self.pointer = Some(pointer);
                self.last_pos = (x, y);
                self.last_time = ctx.now;
                self.history.clear();
                out.emit(ControlEvent::Active);
                let stop = Dynamics::moving(0.0, self.friction);
                self.emit(out, stop, stop);
            }
            Input::PointerMove { pointer, x, y } if self.pointer == Some(pointer) => {
                let dx = x - self.last_pos.0;
                let dy = y - self.last_pos.1;
                let dt = ctx.now.since(self.last_time);
                self.last_pos = (x, y);
                self.last_time = ctx.now;
                self.history.push_back(VelocitySample {
                    dx,
                    dy,
                    dt,
                    at: ctx.now,
                });
                if self.history.len() > VELOCITY_HISTORY_SIZE {
                    self.history.pop_front();
                }
                self.emit(out, Dynamics::offset(-dx / w), Dynamics::offset(-dy / h));
            }
            Input::PointerUp { pointer } if self.pointer == Some(pointer) => {
                let (vx, vy) = self.estimate_velocity(ctx.now);
                self.pointer = None;
                self.history.clear();
                self.emit(
                    out,
                    Dynamics::moving(-vx / w, self.friction),
                    Dynamics::moving(-vy / h, self.friction),
                );
                out.emit(ControlEvent::Inactive);
            }
            _ => {}
        }
    }

    fn reset(&mut self, out: &mut EventBus<ControlEvent>) {
        if self.pointer.take().is_some() {
            self.history.clear();
            let stop = Dynamics::moving(0.0, 1.0);
            self.emit(out, stop, stop);
            out.emit(ControlEvent::Inactive);
        }
    }
}
