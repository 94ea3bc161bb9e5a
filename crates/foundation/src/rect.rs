use serde::{Deserialize, Serialize};

/// Rectangular region in normalized coordinates (`0..1` on both axes, origin
/// top-left).
///
/// Invariant: all fields are finite and `width`/`height` are non-negative.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// The whole unit square.
    pub const FULL: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let r = Self {
            x,
            y,
            width,
            height,
        };
        debug_assert!(r.is_valid(), "invalid rect: {r:?}");
        r
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Exact bitwise identity, usable as a map key.
    pub fn key(&self) -> RectKey {
        // -0.0 and 0.0 describe the same region.
        let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
        RectKey([
            bits(self.x),
            bits(self.y),
            bits(self.width),
            bits(self.height),
        ])
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Hashable identity of a [`Rect`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RectKey([u64; 4]);

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn signed_zero_rects_share_a_key() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(-0.0, 0.0, 1.0, 1.0);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Rect::new(0.0, 0.0, 0.5, 1.0).key());
    }

    #[test]
    fn validity_rejects_negative_and_non_finite() {
        let neg = Rect {
            x: 0.0,
            y: 0.0,
            width: -1.0,
            height: 1.0,
        };
        assert!(!neg.is_valid());
        let nan = Rect {
            x: f64::NAN,
            ..Rect::FULL
        };
        assert!(!nan.is_valid());
        assert!(Rect::FULL.is_valid());
        assert!(Rect::new(0.2, 0.2, 0.0, 0.3).is_empty());
    }

    #[test]
    fn deserializes_from_json() {
        let r: Rect = serde_json::from_str(r#"{"x":0.5,"y":0,"width":0.5,"height":1}"#).unwrap();
        assert_eq!(r, Rect::new(0.5, 0.0, 0.5, 1.0));
    }
}
