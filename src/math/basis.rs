//! Guarded building blocks shared by the closed-form models.
//!
//! Domain policy:
//! - A fractional power of a negative base is undefined over the reals. The
//!   base is clamped to zero first so rounding noise (e.g. `-1e-17`) yields
//!   `0` instead of `NaN`.
//! - Integer exponents keep the sign of the base (`(-2)^3 = -8`).
//! - Stretched-exponential arguments `(t/τ)^n` are exactly `0` at `t = 0` so
//!   decay envelopes start at `1` for any exponent.

/// `base^exp`, clamping a negative base to zero for non-integer exponents.
pub fn clamped_powf(base: f64, exp: f64) -> f64 {
    if exp.fract() == 0.0 {
        base.powf(exp)
    } else {
        base.max(0.0).powf(exp)
    }
}

/// Square root with the base clamped to zero.
pub fn clamped_sqrt(x: f64) -> f64 {
    x.max(0.0).sqrt()
}

/// Stretched-exponential argument `(t/τ)^n`.
pub fn stretched(t: f64, tau: f64, n: f64) -> f64 {
    if t == 0.0 {
        return 0.0;
    }
    clamped_powf(t / tau, n)
}

/// Evaluate `Σ c_k x^k` (ascending coefficient order) via Horner's scheme.
pub fn poly_ascending(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Normalized resonator detuning `(f/1e9 - f0) / f0` for `f` in Hz and `f0` in GHz.
pub fn normalized_detuning(f_hz: f64, f0_ghz: f64) -> f64 {
    (f_hz / 1e9 - f0_ghz) / f0_ghz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_power_of_tiny_negative_is_zero() {
        assert_eq!(clamped_powf(-1e-17, 0.25), 0.0);
        assert_eq!(clamped_sqrt(-1e-17), 0.0);
    }

    #[test]
    fn integer_power_keeps_sign() {
        assert_eq!(clamped_powf(-2.0, 3.0), -8.0);
        assert_eq!(clamped_powf(-2.0, 2.0), 4.0);
    }

    #[test]
    fn stretched_argument_vanishes_at_origin() {
        for &n in &[0.0, 0.5, 1.0, 2.0, -1.0] {
            assert_eq!(stretched(0.0, 3.0, n), 0.0);
        }
        assert!((stretched(2.0, 1.0, 2.0) - 4.0).abs() < 1e-15);
    }

    #[test]
    fn poly_ascending_matches_expansion() {
        // 1 + 2x + 3x^2 at x = 2
        assert_eq!(poly_ascending(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_eq!(poly_ascending(&[], 2.0), 0.0);
    }
}
