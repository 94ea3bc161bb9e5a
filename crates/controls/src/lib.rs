//! Input-driven camera motion.
//!
//! Control methods translate device input into [`Dynamics`] per camera
//! parameter; [`Controls`] integrates them once per tick into offsets that
//! views consume through `update_with_control_parameters`.

pub mod composer;
pub mod dynamics;
pub mod method;
pub mod methods;

pub use composer::{Controls, ControlsError, ControlsEvent};
pub use dynamics::{Dynamics, SETTLE_EPSILON};
pub use method::{ControlEvent, ControlMethod, Input, InputContext};
pub use methods::*;
