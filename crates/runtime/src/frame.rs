use foundation::time::Time;

/// One step of a fixed-rate render loop.
///
/// The engine never reads a wall clock: whoever drives the loop (an
/// animation callback, a test, the headless CLI) hands it frames, so a run
/// replays exactly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub dt_s: f64,
    pub time: Time,
}

impl Frame {
    /// Frame `index` of a sequence that started at time zero. Time is
    /// computed from the index, so long runs do not accumulate rounding.
    pub fn new(index: u64, dt_s: f64) -> Self {
        let dt_s = dt_s.max(0.0);
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// Endless frames `0, 1, 2, …` spaced `dt_s` apart.
    pub fn sequence(dt_s: f64) -> impl Iterator<Item = Frame> {
        (0u64..).map(move |i| Frame::new(i, dt_s))
    }
}
