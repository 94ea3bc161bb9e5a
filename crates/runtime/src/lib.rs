pub mod budget;
pub mod emitter;
pub mod event_bus;
pub mod frame;
pub mod work_queue;

pub use budget::*;
pub use emitter::*;
pub use event_bus::*;
pub use frame::*;
pub use work_queue::*;
