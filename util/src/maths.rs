//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Scale both values by the same factor so that neither magnitude exceeds
/// `limit`, preserving their ratio.
///
/// Returns the scaled pair and the factor that was applied (1 if no scaling
/// was needed).
pub fn scale_to_limit<T>(a: T, b: T, limit: T) -> (T, T, T)
where
    T: Float,
{
    let max_abs = a.abs().max(b.abs());

    if max_abs > limit && max_abs > T::zero() {
        let factor = limit / max_abs;
        (a * factor, b * factor, factor)
    } else {
        (a, b, T::one())
    }
}

/// Normalise an angle into the range (-pi, pi].
pub fn norm_angle<T>(angle: T) -> T
where
    T: Float + FloatConst,
{
    let tau_t = T::PI() + T::PI();

    // Into [0, 2pi), then shift the upper half down so pi itself is kept
    let r = rem_euclid(angle, tau_t);

    if r > T::PI() {
        r - tau_t
    } else {
        r
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Shortest distance between two indices on a ring of `n` elements.
pub fn ring_dist(a: usize, b: usize, n: usize) -> usize {
    let d = (if a > b { a - b } else { b - a }) % n;
    d.min(n - d)
}

#[cfg(test)]
mod test {
    use super::*;

    const TAU: f64 = std::f64::consts::TAU;
    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_norm_angle() {
        assert_eq!(norm_angle(0f64), 0f64);
        assert_eq!(norm_angle(PI), PI);
        assert!((norm_angle(-PI) - PI).abs() < 1e-12);
        assert!((norm_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((norm_angle(-5.0 * TAU + 0.25) - 0.25).abs() < 1e-9);
        assert!((norm_angle(1.5f32) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_rem_euclid() {
        assert!((rem_euclid(-1.0, 3.0) - 2.0f64).abs() < 1e-12);
        assert!((rem_euclid(7.0, 3.0) - 1.0f64).abs() < 1e-12);
    }

    #[test]
    fn test_scale_to_limit() {
        let (a, b, f) = scale_to_limit(2.0, -1.0, 1.0);
        assert_eq!((a, b, f), (1.0, -0.5, 0.5));

        let (a, b, f) = scale_to_limit(0.3, 0.9, 1.0);
        assert_eq!((a, b, f), (0.3, 0.9, 1.0));
    }

    #[test]
    fn test_ring_dist() {
        assert_eq!(ring_dist(0, 71, 72), 1);
        assert_eq!(ring_dist(71, 0, 72), 1);
        assert_eq!(ring_dist(10, 46, 72), 36);
        assert_eq!(ring_dist(5, 5, 72), 0);
    }
}
