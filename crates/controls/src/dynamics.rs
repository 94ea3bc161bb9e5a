use serde::{Deserialize, Serialize};

/// Speeds below this snap to zero so decaying motion ends in finite time.
pub const SETTLE_EPSILON: f64 = 1e-5;

/// Damped motion of one camera parameter.
///
/// `value` is a pending one-shot offset. `velocity` is in parameter units
/// per second and decays exponentially: after `t` seconds it has been
/// multiplied by `(1 - friction)^t`. A friction of `0` keeps the velocity
/// forever and a friction of `1` stops it at once.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dynamics {
    pub value: f64,
    pub velocity: f64,
    pub friction: f64,
}

impl Dynamics {
    pub fn new(value: f64, velocity: f64, friction: f64) -> Self {
        Self {
            value,
            velocity,
            friction,
        }
    }

    /// A one-shot offset with no lasting motion.
    pub fn offset(value: f64) -> Self {
        Self::new(value, 0.0, 0.0)
    }

    pub fn moving(velocity: f64, friction: f64) -> Self {
        Self::new(0.0, velocity, friction)
    }

    fn retention(&self) -> f64 {
        (1.0 - self.friction).clamp(0.0, 1.0)
    }

    /// Distance covered by the decaying velocity over `elapsed` seconds.
    pub fn offset_from_velocity(&self, elapsed: f64) -> f64 {
        let dt = elapsed.max(0.0);
        if self.velocity == 0.0 || dt == 0.0 {
            return 0.0;
        }
        let r = self.retention();
        if r >= 1.0 {
            return self.velocity * dt;
        }
        if r <= 0.0 {
            return 0.0;
        }
        // Integral of v * r^t over [0, dt].
        self.velocity * (1.0 - r.powf(dt)) / -r.ln()
    }

    pub fn velocity_after(&self, elapsed: f64) -> f64 {
        let dt = elapsed.max(0.0);
        let r = self.retention();
        if r >= 1.0 {
            return self.velocity;
        }
        let v = self.velocity * r.powf(dt);
        if v.abs() < SETTLE_EPSILON { 0.0 } else { v }
    }

    /// Folds a newer state in, after integrating the current velocity over
    /// the `elapsed` seconds since the previous update.
    pub fn update(&mut self, newer: &Dynamics, elapsed: f64) {
        self.value += newer.value + self.offset_from_velocity(elapsed);
        self.velocity = newer.velocity;
        self.friction = newer.friction;
    }

    /// Advances by `elapsed` seconds, returning the total offset produced
    /// (pending value included) and consuming it.
    pub fn advance(&mut self, elapsed: f64) -> f64 {
        let offset = self.value + self.offset_from_velocity(elapsed);
        self.value = 0.0;
        self.velocity = self.velocity_after(elapsed);
        offset
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_settled(&self) -> bool {
        self.value == 0.0 && self.velocity == 0.0
    }
}
