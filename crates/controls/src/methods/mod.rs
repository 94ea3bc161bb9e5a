mod drag;
mod key;
mod qtvr;
mod velocity;
mod zoom;

pub use drag::{DEFAULT_DRAG_FRICTION, DragControlMethod};
pub use key::KeyControlMethod;
pub use qtvr::{DEFAULT_QTVR_SPEED, QtvrControlMethod};
pub use velocity::{VelocityControlMethod, VelocityHandle};
pub use zoom::{DEFAULT_ZOOM_DELTA, PinchZoomControlMethod, ScrollZoomControlMethod};
