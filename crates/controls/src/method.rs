use foundation::Time;
use runtime::EventBus;
use serde::{Deserialize, Serialize};
use view::ControlParameter;

use crate::dynamics::Dynamics;

/// Device-neutral user input. Positions are element pixels from the
/// top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    PointerDown { pointer: u32, x: f64, y: f64 },
    PointerMove { pointer: u32, x: f64, y: f64 },
    PointerUp { pointer: u32 },
    /// Wheel delta in pixels; positive scrolls down.
    Wheel { delta: f64 },
    KeyDown { key: String },
    KeyUp { key: String },
}

/// What a method may know about the moment and the element an input
/// arrived on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InputContext {
    pub now: Time,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Active,
    Inactive,
    ParameterDynamics {
        parameter: ControlParameter,
        dynamics: Dynamics,
    },
}

impl ControlEvent {
    pub fn dynamics(parameter: ControlParameter, dynamics: Dynamics) -> Self {
        ControlEvent::ParameterDynamics {
            parameter,
            dynamics,
        }
    }
}

/// Turns input into camera motion.
///
/// A method brackets each interaction with `Active`/`Inactive` and reports
/// motion as `ParameterDynamics` in between; the last dynamics it reports
/// before `Inactive` may keep a velocity that decays afterwards.
pub trait ControlMethod {
    fn handle(&mut self, input: &Input, ctx: &InputContext, out: &mut EventBus<ControlEvent>);

    /// Called once per tick before motion is integrated, for methods driven
    /// by something other than input.
    fn poll(&mut self, _ctx: &InputContext, _out: &mut EventBus<ControlEvent>) {}

    /// Abandons any interaction in progress, e.g. when the method is
    /// disabled. Must leave the method inactive.
    fn reset(&mut self, out: &mut EventBus<ControlEvent>);
}
