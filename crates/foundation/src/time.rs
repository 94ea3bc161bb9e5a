/// Engine time in seconds. Supplied by the caller each frame; nothing in
/// the engine reads a clock.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn after(self, seconds: f64) -> Time {
        Time(self.0 + seconds)
    }
}

/// The interval an animation runs over.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: Time,
    pub duration_s: f64,
}

impl TimeSpan {
    /// Negative durations are treated as zero.
    pub fn new(start: Time, duration_s: f64) -> Self {
        Self {
            start,
            duration_s: duration_s.max(0.0),
        }
    }

    pub fn end(&self) -> Time {
        self.start.after(self.duration_s)
    }

    /// Fraction of the span elapsed at `t`, clamped to `[0, 1]`.
    ///
    /// Zero-length spans are complete as soon as they start.
    pub fn progress(&self, t: Time) -> f64 {
        let d = self.duration_s;
        if d <= 0.0 {
            return if t.0 >= self.start.0 { 1.0 } else { 0.0 };
        }
        ((t.0 - self.start.0) / d).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Time, TimeSpan};

    #[test]
    fn progress_is_clamped() {
        let span = TimeSpan::new(Time(1.0), 2.0);
        assert_eq!(span.progress(Time(0.0)), 0.0);
        assert_eq!(span.progress(Time(2.0)), 0.5);
        assert_eq!(span.progress(Time(10.0)), 1.0);
    }

    #[test]
    fn empty_span_completes_immediately() {
        let span = TimeSpan::new(Time(3.0), -1.0);
        assert_eq!(span.end(), Time(3.0));
        assert_eq!(span.progress(Time(3.0)), 1.0);
        assert_eq!(span.progress(Time(2.9)), 0.0);
    }

    #[test]
    fn since_never_goes_negative() {
        assert_eq!(Time(1.0).since(Time(2.0)), 0.0);
        assert_eq!(Time(2.5).since(Time(2.0)), 0.5);
    }
}
