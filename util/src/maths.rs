//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// Due to floating point round-off the raw remainder can equal `rhs.abs()` when `lhs` is a tiny
/// negative number, in which case zero is returned so that the result always lies in
/// `[0, rhs.abs())`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    let r = if r < T::zero() { r + rhs.abs() } else { r };

    if r >= rhs.abs() { T::zero() } else { r }
}

/// Normalise an angle in degrees into `[0, 360)`.
///
/// Normalising an already normalised angle returns it unchanged.
pub fn normalize_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    let full_turn = T::from(360.0).unwrap_or_else(T::max_value);
    rem_euclid(angle_deg, full_turn)
}

/// Normalise an angle in radians into `[-pi, pi)`.
pub fn wrap_pi<T>(angle_rad: T) -> T
where
    T: Float
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::max_value);
    let tau_t = pi_t + pi_t;

    rem_euclid(angle_rad + pi_t, tau_t) - pi_t
}

/// Return -1, 0 or +1 depending on the sign of the value.
///
/// Unlike `Float::signum` zero maps to zero.
pub fn sign<T>(value: T) -> T
where
    T: Float
{
    if value > T::zero() {
        T::one()
    }
    else if value < T::zero() {
        -T::one()
    }
    else {
        T::zero()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_normalize_deg() {
        assert_eq!(normalize_deg(0.0), 0.0);
        assert_eq!(normalize_deg(360.0), 0.0);
        assert_eq!(normalize_deg(-90.0), 270.0);
        assert_eq!(normalize_deg(725.0), 5.0);
        assert!(normalize_deg(-1e-18) < 360.0);

        for x in [-1234.5, -360.0, -0.25, 12.0, 359.99, 1e6].iter() {
            let n = normalize_deg(*x);
            assert!(n >= 0.0 && n < 360.0, "{} normalised to {}", x, n);

            // Congruent mod 360
            let k = ((x - n) / 360.0).round();
            assert!((x - n - k * 360.0).abs() < 1e-6);

            // Idempotent
            assert_eq!(normalize_deg(n), n);
        }
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(PI) - -PI).abs() < 1e-12);
        assert!((wrap_pi(2.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((wrap_pi(-2.5 * PI) - -0.5 * PI).abs() < 1e-12);
        assert_eq!(wrap_pi(0.0), 0.0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(0.1), 1.0);
    }
}
