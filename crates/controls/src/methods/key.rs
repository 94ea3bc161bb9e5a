use runtime::EventBus;
use view::ControlParameter;

use crate::dynamics::Dynamics;
use crate::method::{ControlEvent, ControlMethod, Input, InputContext};

/// Holds one parameter at a constant velocity while a key is down, then
/// lets it coast to a stop with `friction`.
#[derive(Debug, Clone)]
pub struct KeyControlMethod {
    key: String,
    parameter: ControlParameter,
    velocity: f64,
    friction: f64,
    pressed: bool,
}

impl KeyControlMethod {
    pub fn new(
        key: impl Into<String>,
        parameter: ControlParameter,
        velocity: f64,
        friction: f64,
    ) -> Self {
        Self {
            key: key.into(),
            parameter,
            velocity,
            friction,
            pressed: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parameter(&self) -> ControlParameter {
        self.parameter
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl ControlMethod for KeyControlMethod {
    fn handle(&mut self, input: &Input, _ctx: &InputContext, out: &mut EventBus<ControlEvent>) {
        match input {
            // Auto-repeat delivers KeyDown again while held.
            Input::KeyDown { key } if *key == self.key && !self.pressed => {
                self.pressed = true;
                out.emit(ControlEvent::Active);
                out.emit(ControlEvent::dynamics(
                    self.parameter,
                    Dynamics::moving(self.velocity, 0.0),
                ));
            }
            Input::KeyUp { key } if *key == self.key && self.pressed => {
                self.pressed = false;
                out.emit(ControlEvent::dynamics(
                    self.parameter,
                    Dynamics::moving(self.velocity, self.friction),
                ));
                out.emit(ControlEvent::Inactive);
            }
            _ => {}
        }
    }

    fn reset(&mut self, out: &mut EventBus<ControlEvent>) {
        if self.pressed {
            self.pressed = false;
            out.emit(ControlEvent::dynamics(self.parameter, Dynamics::moving(0.0, 1.0)));
            out.emit(ControlEvent::Inactive);
        }
    }
}
