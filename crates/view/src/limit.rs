/// Pure function constraining a view's parameters.
///
/// Limiters run on every update, after the requested change has been applied
/// and before the view decides whether anything changed.
pub type Limiter<P> = Box<dyn Fn(P) -> P>;

/// Chains limiters left to right.
pub fn compose<P: 'static>(limiters: Vec<Limiter<P>>) -> Limiter<P> {
    Box::new(move |params| limiters.iter().fold(params, |p, limit| limit(p)))
}

/// Clamps `value` into `[min, max]`, centring it when the range is inverted.
pub(crate) fn clamp_range(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        return (min + max) / 2.0;
    }
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::{Limiter, clamp_range, compose};

    #[test]
    fn compose_applies_in_order() {
        let add: Limiter<f64> = Box::new(|v| v + 1.0);
        let double: Limiter<f64> = Box::new(|v| v * 2.0);
        let both = compose(vec![add, double]);
        assert_eq!(both(1.0), 4.0);
    }

    #[test]
    fn inverted_range_centres() {
        assert_eq!(clamp_range(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp_range(5.0, 2.0, 0.0), 1.0);
    }
}
