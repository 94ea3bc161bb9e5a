use runtime::EventBus;
use view::ControlParameter;

use crate::dynamics::Dynamics;
use crate::method::{ControlEvent, ControlMethod, Input, InputContext};

pub const DEFAULT_QTVR_SPEED: f64 = 8.0;

/// Joystick-style panning: the further the pointer is from where it was
/// pressed, the faster the view turns. Stops as soon as it is released.
///
/// Drives `x`/`y` with velocities in element sizes per second.
#[derive(Debug, Clone)]
pub struct QtvrControlMethod {
    speed: f64,
    pointer: Option<u32>,
    origin: (f64, f64),
}

impl Default for QtvrControlMethod {
    fn default() -> Self {
        Self::new(DEFAULT_QTVR_SPEED)
    }
}

impl QtvrControlMethod {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            pointer: None,
            origin: (0.0, 0.0),
        }
    }

    fn emit(out: &mut EventBus<ControlEvent>, vx: f64, vy: f64) {
        out.emit(ControlEvent::dynamics(ControlParameter::X, Dynamics::moving(vx, 0.0)));
        out.emit(ControlEvent::dynamics(ControlParameter::Y, Dynamics::moving(vy, 0.0)));
    }
}

impl ControlMethod for QtvrControlMethod {
    fn handle(&mut self, input: &Input, ctx: &InputContext, out: &mut EventBus<ControlEvent>) {
        match *input {
            Input::PointerDown { pointer, x, y } if self.pointer.is_none() => {
                self.pointer = Some(pointer);
                self.origin = (x, y);
                out.emit(ControlEvent::Active);
            }
            Input::PointerMove { pointer, x, y } if self.pointer == Some(pointer) => {
                let vx = (x - self.origin.0) / ctx.width.max(1.0) * self.speed;
                let vy = (y - self.origin.1) / ctx.height.max(1.0) * self.speed;
                Self::emit(out, vx, vy);
            }
            Input::PointerUp { pointer } if self.pointer == Some(pointer) => {
                self.pointer = None;
                Self::emit(out, 0.0, 0.0);
                out.emit(ControlEvent::Inactive);
            }
            _ => {}
        }
    }

    fn reset(&mut self, out: &mut EventBus<ControlEvent>) {
        if self.pointer.take().is_some() {
            Self::emit(out, 0.0, 0.0);
            out.emit(ControlEvent::Inactive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QtvrControlMethod;
    use crate::dynamics::Dynamics;
    use crate::method::{ControlEvent, ControlMethod, Input, InputContext};
    use foundation::Time;
    use runtime::EventBus;
    use view::ControlParameter;

    #[test]
    fn velocity_grows_with_distance_from_origin() {
        let ctx = InputContext {
            now: Time::ZERO,
            width: 200.0,
            height: 100.0,
        };
        let mut qtvr = QtvrControlMethod::new(4.0);
        let mut bus = EventBus::new();
        qtvr.handle(&Input::PointerDown { pointer: 0, x: 100.0, y: 50.0 }, &ctx, &mut bus);
        qtvr.handle(&Input::PointerMove { pointer: 0, x: 150.0, y: 50.0 }, &ctx, &mut bus);
        let events: Vec<ControlEvent> = bus.drain_events().collect();
        assert_eq!(
            events[1],
            ControlEvent::dynamics(ControlParameter::X, Dynamics::moving(1.0, 0.0))
        );

        qtvr.handle(&Input::PointerUp { pointer: 0 }, &ctx, &mut bus);
        let events: Vec<ControlEvent> = bus.drain_events().collect();
        assert_eq!(
            events[0],
            ControlEvent::dynamics(ControlParameter::X, Dynamics::moving(0.0, 0.0))
        );
        assert_eq!(events[2], ControlEvent::Inactive);
    }
}
