use std::sync::atomic::{AtomicU64, Ordering};

static SERIAL: AtomicU64 = AtomicU64::new(1);

/// Next value of a process-wide counter shared by every engine identity
/// (geometries, layers). Never returns the same value twice and never 0.
pub fn next_serial() -> u64 {
    SERIAL.fetch_add(1, Ordering::Relaxed)
}
