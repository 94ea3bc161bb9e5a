//! Stateless helpers shared across the engine.

use core::cmp::Ordering;

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Euclidean modulo: the result always has the sign of `m` (non-negative for
/// positive `m`).
pub fn modulo(value: f64, m: f64) -> f64 {
    let r = value % m;
    if r < 0.0 { r + m } else { r }
}

/// Wraps an angle into `[-π, π)`.
pub fn wrap_angle(rad: f64) -> f64 {
    modulo(rad + core::f64::consts::PI, core::f64::consts::TAU) - core::f64::consts::PI
}

/// Jenkins one-at-a-time hash over a sequence of words.
///
/// Pure and deterministic across runs and platforms, so it can be used to
/// identify tiles in logs and test expectations.
pub fn hash(words: &[u32]) -> u32 {
    let mut h: u32 = 0;
    for &k in words {
        h = h.wrapping_add(k);
        h = h.wrapping_add(h << 10);
        h ^= h >> 6;
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h = h.wrapping_add(h << 15);
    h
}

/// Three-way comparison for floats; NaN sorts after every number.
pub fn cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Converts a field of view spanning `from_len` pixels into the one spanning
/// `to_len` pixels on the same image plane.
fn convert_fov(fov: f64, from_len: f64, to_len: f64) -> f64 {
    if from_len <= 0.0 || to_len <= 0.0 {
        return fov;
    }
    2.0 * ((to_len * (fov / 2.0).tan()) / from_len).atan()
}

/// Field of view conversions between horizontal, vertical and diagonal
/// apertures for a `width`×`height` viewport. Degenerate viewports return the
/// input unchanged.
pub mod fov {
    use super::convert_fov;

    pub fn htov(fov: f64, width: f64, height: f64) -> f64 {
        convert_fov(fov, width, height)
    }

    pub fn vtoh(fov: f64, width: f64, height: f64) -> f64 {
        convert_fov(fov, height, width)
    }

    pub fn htod(fov: f64, width: f64, height: f64) -> f64 {
        convert_fov(fov, width, width.hypot(height))
    }

    pub fn dtoh(fov: f64, width: f64, height: f64) -> f64 {
        convert_fov(fov, width.hypot(height), width)
    }

    pub fn vtod(fov: f64, width: f64, height: f64) -> f64 {
        convert_fov(fov, height, width.hypot(height))
    }

    pub fn dtov(fov: f64, width: f64, height: f64) -> f64 {
        convert_fov(fov, width.hypot(height), height)
    }
}

pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = clamp(t, 0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Interpolates from `from` to `to` by an already-eased progress value.
pub fn tween(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

#[cfg(test)]
mod tests {
    use super::{clamp, ease_in_out_quad, fov, hash, modulo, wrap_angle};
    use core::f64::consts::{FRAC_PI_2, PI};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn modulo_is_non_negative() {
        assert_eq!(modulo(-1.0, 4.0), 3.0);
        assert_eq!(modulo(5.0, 4.0), 1.0);
        assert_eq!(modulo(0.0, 4.0), 0.0);
    }

    #[test]
    fn wrap_angle_lands_in_half_open_range() {
        assert_close(wrap_angle(3.0 * PI + 0.5), -PI + 0.5, 1e-9);
        assert_close(wrap_angle(-FRAC_PI_2), -FRAC_PI_2, 1e-12);
        assert_close(wrap_angle(PI + 0.1), -PI + 0.1, 1e-12);
    }

    #[test]
    fn hash_is_deterministic_and_order_sensitive() {
        assert_eq!(hash(&[1, 2, 3]), hash(&[1, 2, 3]));
        assert_ne!(hash(&[1, 2, 3]), hash(&[3, 2, 1]));
        assert_eq!(hash(&[]), 0);
    }

    #[test]
    fn fov_conversions_round_trip() {
        let h = fov::vtoh(FRAC_PI_2, 200.0, 100.0);
        assert!(h > FRAC_PI_2);
        assert_close(fov::htov(h, 200.0, 100.0), FRAC_PI_2, 1e-12);
        let d = fov::vtod(1.0, 300.0, 100.0);
        assert_close(fov::dtov(d, 300.0, 100.0), 1.0, 1e-12);
        assert_close(fov::dtoh(fov::htod(0.7, 4.0, 3.0), 4.0, 3.0), 0.7, 1e-12);
        assert_eq!(fov::vtoh(1.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn easing_hits_endpoints() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
    }
}
