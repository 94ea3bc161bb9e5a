use std::cell::Cell;
use std::rc::Rc;

use runtime::EventBus;
use view::ControlParameter;

use crate::dynamics::Dynamics;
use crate::method::{ControlEvent, ControlMethod, Input, InputContext};

#[derive(Debug, Copy, Clone, Default)]
struct Requested {
    velocity: f64,
    friction: f64,
    dirty: bool,
}

/// Application-side handle for driving a [`VelocityControlMethod`], e.g.
/// from on-screen buttons or an autorotate timer.
#[derive(Debug, Clone, Default)]
pub struct VelocityHandle {
    state: Rc<Cell<Requested>>,
}

impl VelocityHandle {
    pub fn set_velocity(&self, velocity: f64) {
        let mut s = self.state.get();
        s.velocity = velocity;
        s.dirty = true;
        self.state.set(s);
    }

    pub fn set_friction(&self, friction: f64) {
        let mut s = self.state.get();
        s.friction = friction;
        s.dirty = true;
        self.state.set(s);
    }

    pub fn velocity(&self) -> f64 {
        self.state.get().velocity
    }
}

/// Moves one parameter at whatever velocity the application last set.
/// Changes are picked up on the next tick.
#[derive(Debug)]
pub struct VelocityControlMethod {
    parameter: ControlParameter,
    state: Rc<Cell<Requested>>,
    active: bool,
}

impl VelocityControlMethod {
    pub fn new(parameter: ControlParameter) -> (Self, VelocityHandle) {
        let handle = VelocityHandle::default();
        let method = Self {
            parameter,
            state: Rc::clone(&handle.state),
            active: false,
        };
        (method, handle)
    }
}

impl ControlMethod for VelocityControlMethod {
    fn handle(&mut self, _input: &Input, _ctx: &InputContext, _out: &mut EventBus<ControlEvent>) {}

    fn poll(&mut self, _ctx: &InputContext, out: &mut EventBus<ControlEvent>) {
        let mut s = self.state.get();
        if !s.dirty {
            return;
        }
        s.dirty = false;
        self.state.set(s);

        let moving = s.velocity != 0.0;
        if moving && !self.active {
            self.active = true;
            out.emit(ControlEvent::Active);
        }
        out.emit(ControlEvent::dynamics(
            self.parameter,
            Dynamics::moving(s.velocity, s.friction),
        ));
        if !moving && self.active {
            self.active = false;
            out.emit(ControlEvent::Inactive);
        }
    }

    fn reset(&mut self, out: &mut EventBus<ControlEvent>) {
        self.state.set(Requested::default());
        if self.active {
            self.active = false;
            out.emit(ControlEvent::dynamics(self.parameter, Dynamics::moving(0.0, 1.0)));
            out.emit(ControlEvent::Inactive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VelocityControlMethod;
    use crate::dynamics::Dynamics;
    use crate::method::{ControlEvent, ControlMethod, InputContext};
    use foundation::Time;
    use pretty_assertions::assert_eq;
    use runtime::EventBus;
    use view::ControlParameter;

    #[test]
    fn handle_changes_show_up_on_poll() {
        let ctx = InputContext {
            now: Time::ZERO,
            width: 1.0,
            height: 1.0,
        };
        let (mut method, handle) = VelocityControlMethod::new(ControlParameter::Yaw);
        let mut bus = EventBus::new();
        method.poll(&ctx, &mut bus);
        assert!(bus.is_empty());

        handle.set_velocity(0.3);
        method.poll(&ctx, &mut bus);
        method.poll(&ctx, &mut bus);
        handle.set_velocity(0.0);
        method.poll(&ctx, &mut bus);

        let events: Vec<ControlEvent> = bus.drain_events().collect();
        assert_eq!(
            events,
            vec![
                ControlEvent::Active,
                ControlEvent::dynamics(ControlParameter::Yaw, Dynamics::moving(0.3, 0.0)),
                ControlEvent::dynamics(ControlParameter::Yaw, Dynamics::moving(0.0, 0.0)),
                ControlEvent::Inactive,
            ]
        );
    }
}
