mod vec;

pub use vec::*;
