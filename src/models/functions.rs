//! Closed-form model functions.
//!
//! Every function is pure: scalar in, scalar (or complex) out. Units follow
//! lab conventions: times in seconds, frequencies in Hz unless a parameter is
//! documented as GHz (resonator `f0`, Lorentzian center `f0`), flux in units
//! of the flux quantum.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::math::{clamped_powf, clamped_sqrt, normalized_detuning, poly_ascending, stretched};

/// Randomized benchmarking decay: `amplitude·p^n + offset`.
pub fn randomized_benchmarking_decay(num_cliff: f64, amplitude: f64, p: f64, offset: f64) -> f64 {
    amplitude * clamped_powf(p, num_cliff) + offset
}

/// Lorentzian peak `(A/π)·σ/((f-center)² + σ²)`.
pub fn lorentz(f: f64, amplitude: f64, center: f64, sigma: f64) -> f64 {
    let d = f - center;
    amplitude / PI * (sigma / (d * d + sigma * sigma))
}

/// Lorentzian with offset, `f` in Hz and `f0`, `kappa` in GHz.
pub fn lorentzian(f: f64, a: f64, offset: f64, f0: f64, kappa: f64) -> f64 {
    offset + lorentz(f / 1e9, a, f0, kappa)
}

/// Two Lorentzian peaks on a constant background.
#[allow(clippy::too_many_arguments)]
pub fn twin_lorentz(
    f: f64,
    amplitude_a: f64,
    amplitude_b: f64,
    center_a: f64,
    center_b: f64,
    sigma_a: f64,
    sigma_b: f64,
    background: f64,
) -> f64 {
    lorentz(f, amplitude_a, center_a, sigma_a) + lorentz(f, amplitude_b, center_b, sigma_b) + background
}

/// Transmon cosine arc for uncalibrated flux (DAC voltage).
///
/// `asymmetry = |EJ1 - EJ2| / (EJ1 + EJ2)`. The bracketed term is clamped to
/// zero before the quarter power.
pub fn qubit_freq_dac(
    dac_voltage: f64,
    f_max: f64,
    e_c: f64,
    dac_sweet_spot: f64,
    dac_flux_coefficient: f64,
    asymmetry: f64,
) -> f64 {
    let c = (dac_flux_coefficient * (dac_voltage - dac_sweet_spot)).cos();
    let a2 = asymmetry * asymmetry;
    let inner = a2 + (1.0 - a2) * c * c;
    (f_max + e_c) * clamped_powf(inner, 0.25) - e_c
}

/// Transmon cosine arc for calibrated flux.
///
/// The absolute value of the cosine is taken, so the result stays real past
/// half a flux quantum.
pub fn qubit_freq_flux(flux: f64, f_max: f64, e_c: f64, flux_zero: f64, dac_offset: f64) -> f64 {
    let c = (PI * (flux - dac_offset) / flux_zero).cos();
    (f_max + e_c) * clamped_sqrt(c.abs()) - e_c
}

/// `amplitude·cos(2π·f·t + phase) + offset`, frequency in Hz.
pub fn cos_func(t: f64, amplitude: f64, frequency: f64, phase: f64, offset: f64) -> f64 {
    amplitude * (2.0 * PI * frequency * t + phase).cos() + offset
}

/// Stretched exponential decay `amplitude·exp(-(t/τ)^n) + offset`.
pub fn exp_decay(t: f64, tau: f64, amplitude: f64, offset: f64, n: f64) -> f64 {
    amplitude * (-stretched(t, tau, n)).exp() + offset
}

/// Stretched-exponential damped oscillation.
#[allow(clippy::too_many_arguments)]
pub fn exp_damp_osc(
    t: f64,
    tau: f64,
    n: f64,
    frequency: f64,
    phase: f64,
    amplitude: f64,
    oscillation_offset: f64,
    exponential_offset: f64,
) -> f64 {
    let envelope = (-stretched(t, tau, n)).exp();
    amplitude * envelope * ((2.0 * PI * frequency * t + phase).cos() + oscillation_offset)
        + exponential_offset
}

/// Oscillation under combined Gaussian (`tau_2`) and exponential (`tau`) damping.
#[allow(clippy::too_many_arguments)]
pub fn gauss_exp_damp_osc(
    t: f64,
    tau: f64,
    tau_2: f64,
    frequency: f64,
    phase: f64,
    amplitude: f64,
    oscillation_offset: f64,
    exponential_offset: f64,
) -> f64 {
    let g = t / tau_2;
    let envelope = (-(g * g) - t / tau).exp();
    amplitude * envelope * ((2.0 * PI * frequency * t + phase).cos() + oscillation_offset)
        + exponential_offset
}

/// One oscillation component of [`exp_damp_dbl_osc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    pub frequency: f64,
    pub phase: f64,
    pub amplitude: f64,
    pub offset: f64,
}

impl Oscillation {
    fn at(&self, t: f64) -> f64 {
        self.amplitude * ((2.0 * PI * self.frequency * t + self.phase).cos() + self.offset)
    }
}

/// Single stretched-exponential envelope modulating two independent cosines.
pub fn exp_damp_dbl_osc(
    t: f64,
    tau: f64,
    n: f64,
    first: Oscillation,
    second: Oscillation,
    exponential_offset: f64,
) -> f64 {
    let envelope = (-stretched(t, tau, n)).exp();
    envelope * first.at(t) + envelope * second.at(t) + exponential_offset
}

/// Complex hanger-resonator transmission.
///
/// `f` in Hz, `f0` in GHz, `theta` is the asymmetry angle.
pub fn hanger_complex(f: f64, f0: f64, q: f64, qe: f64, a: f64, theta: f64) -> Complex64 {
    let i = Complex64::i();
    let coupling = (q / qe) * (i * theta).exp();
    let lineshape = Complex64::new(1.0, 0.0) + 2.0 * i * q * normalized_detuning(f, f0);
    a * (Complex64::new(1.0, 0.0) - coupling / lineshape)
}

/// Magnitude of [`hanger_complex`].
pub fn hanger_amplitude(f: f64, f0: f64, q: f64, qe: f64, a: f64, theta: f64) -> f64 {
    hanger_complex(f, f0, q, qe, a, theta).norm()
}

/// Hanger amplitude on a polynomial background in normalized detuning.
///
/// `poly_coeffs` are in ascending power order: `1 + c0 + c1·d + c2·d² + ...`.
#[allow(clippy::too_many_arguments)]
pub fn poly_bg_hanger_amplitude(
    f: f64,
    f0: f64,
    q: f64,
    qe: f64,
    a: f64,
    theta: f64,
    poly_coeffs: &[f64],
) -> f64 {
    let d = normalized_detuning(f, f0);
    ((1.0 + poly_ascending(poly_coeffs, d)) * hanger_amplitude(f, f0, q, qe, a, theta)).abs()
}

/// Hanger amplitude with a linear background slope.
#[allow(clippy::too_many_arguments)]
pub fn sloped_hanger_amplitude(
    f: f64,
    f0: f64,
    q: f64,
    qe: f64,
    a: f64,
    theta: f64,
    slope: f64,
) -> f64 {
    let d = normalized_detuning(f, f0);
    ((1.0 + slope * d) * hanger_amplitude(f, f0, q, qe, a, theta)).abs()
}

/// Complex sloped hanger transmission with a linear phase.
///
/// `f_ref` is the first frequency of the sweep; the phase is
/// `phi_v·(f - f_ref) + phi_0`.
#[allow(clippy::too_many_arguments)]
pub fn sloped_hanger_complex(
    f: f64,
    f_ref: f64,
    f0: f64,
    q: f64,
    qe: f64,
    a: f64,
    theta: f64,
    phi_v: f64,
    phi_0: f64,
    slope: f64,
) -> Complex64 {
    let d = normalized_detuning(f, f0);
    let phase = (Complex64::i() * (phi_v * f + phi_0 - phi_v * f_ref)).exp();
    (1.0 + slope * d) * phase * hanger_complex(f, f0, q, qe, a, theta)
}

/// Quadrature sum of a linear signal and a fixed background: `sqrt((a·x)² + b²)`.
pub fn linear_with_background(x: f64, a: f64, b: f64) -> f64 {
    let s = a * x;
    (s * s + b * b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hanger_amplitude_is_magnitude_of_complex() {
        let cases = [
            (7.1e9, 7.1, 1e4, 2e4, 1.0, 0.0),
            (7.0999e9, 7.1, 5e3, 8e3, 0.7, 0.3),
            (5.2e9, 5.21, 1e5, 1e5, 2.5, -1.2),
        ];
        for &(f, f0, q, qe, a, theta) in &cases {
            let c = hanger_complex(f, f0, q, qe, a, theta);
            assert_eq!(hanger_amplitude(f, f0, q, qe, a, theta), c.norm());
        }
    }

    #[test]
    fn hanger_dips_on_resonance() {
        // On resonance with theta = 0: |A(1 - Q/Qe)|.
        let v = hanger_amplitude(7.1e9, 7.1, 1e4, 2e4, 1.0, 0.0);
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn exp_decay_at_origin_is_amplitude_plus_offset() {
        for &n in &[0.5, 1.0, 2.0, 3.7, 0.0] {
            assert_eq!(exp_decay(0.0, 12e-6, 0.8, 0.1, n), 0.8 + 0.1);
        }
    }

    #[test]
    fn cos_func_is_periodic() {
        let (amp, freq, phase, off) = (0.7, 5e6, 0.3, 0.05);
        for i in 0..20 {
            let t = i as f64 * 13e-9;
            let a = cos_func(t, amp, freq, phase, off);
            let b = cos_func(t + 1.0 / freq, amp, freq, phase, off);
            assert!((a - b).abs() < 1e-9, "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn qubit_freq_flux_stays_finite_past_half_flux() {
        let f = qubit_freq_flux(0.5, 6e9, 250e6, 1.0, 0.0);
        assert!(f.is_finite());
        // cos(π/2) ~ 6e-17 rounds to a tiny value, so the arc bottoms out near -E_c.
        assert!((f + 250e6).abs() < 1.0e3);

        let g = qubit_freq_flux(0.75, 6e9, 250e6, 1.0, 0.0);
        assert!(g.is_finite());
        assert!(g > -250e6);
    }

    #[test]
    fn qubit_freq_flux_at_sweet_spot_is_f_max() {
        let f = qubit_freq_flux(0.0, 6e9, 250e6, 1.0, 0.0);
        assert!((f - 6e9).abs() < 1e-3);
    }

    #[test]
    fn qubit_freq_dac_peaks_at_sweet_spot() {
        let f = qubit_freq_dac(1.0, 6e9, 250e6, 0.0, 1.0, 1.5);
        assert!(f.is_finite());
        let sweet = qubit_freq_dac(0.0, 6e9, 250e6, 0.0, 1.0, 0.0);
        assert!((sweet - 6e9).abs() < 1e-3);
    }

    #[test]
    fn linear_with_background_at_zero_is_background() {
        assert_eq!(linear_with_background(0.0, 2.0, 3.0), 3.0);
        assert_eq!(linear_with_background(2.0, 2.0, 3.0), 5.0);
    }

    #[test]
    fn lorentz_peak_height() {
        let v = lorentz(1.0, PI, 1.0, 0.5);
        assert!((v - 2.0).abs() < 1e-12);
        // Lorentzian rescales Hz to GHz before evaluation.
        assert!((lorentzian(1e9, PI, 0.1, 1.0, 0.5) - 2.1).abs() < 1e-12);
    }

    #[test]
    fn twin_lorentz_is_sum_plus_background() {
        let v = twin_lorentz(0.3, 1.0, 2.0, 0.0, 1.0, 0.2, 0.4, 0.5);
        let expected = lorentz(0.3, 1.0, 0.0, 0.2) + lorentz(0.3, 2.0, 1.0, 0.4) + 0.5;
        assert_eq!(v, expected);
    }

    #[test]
    fn randomized_benchmarking_starts_at_amplitude_plus_offset() {
        assert_eq!(randomized_benchmarking_decay(0.0, 0.5, 0.99, 0.5), 1.0);
        let v = randomized_benchmarking_decay(100.0, 0.5, 0.99, 0.5);
        assert!((v - (0.5 * 0.99f64.powi(100) + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn sloped_hanger_complex_phase_referenced_to_first_sample() {
        let (f0, q, qe, a, theta) = (7.1, 1e4, 2e4, 1.0, 0.1);
        let f = 7.09e9;
        let z = sloped_hanger_complex(f, f, f0, q, qe, a, theta, 1e-6, 0.0, 0.0);
        let h = hanger_complex(f, f0, q, qe, a, theta);
        assert!((z - h).norm() < 1e-12);
    }

    #[test]
    fn sloped_hanger_amplitude_reduces_to_plain_without_slope() {
        let (f, f0, q, qe, a, theta) = (7.0995e9, 7.1, 1e4, 2e4, 1.0, 0.2);
        assert_eq!(
            sloped_hanger_amplitude(f, f0, q, qe, a, theta, 0.0),
            hanger_amplitude(f, f0, q, qe, a, theta)
        );
        assert_eq!(
            poly_bg_hanger_amplitude(f, f0, q, qe, a, theta, &[0.0; 8]),
            hanger_amplitude(f, f0, q, qe, a, theta)
        );
    }

    #[test]
    fn damped_oscillations_reduce_to_envelope_at_origin() {
        let v = exp_damp_osc(0.0, 1e-6, 1.0, 2e6, 0.0, 0.5, 0.0, 0.5);
        assert!((v - 1.0).abs() < 1e-15);
        let g = gauss_exp_damp_osc(0.0, 1e-6, 2e-6, 2e6, 0.0, 0.5, 0.0, 0.5);
        assert!((g - 1.0).abs() < 1e-15);
        let osc = Oscillation { frequency: 1e6, phase: 0.0, amplitude: 0.25, offset: 0.0 };
        let d = exp_damp_dbl_osc(0.0, 1e-6, 1.0, osc, osc, 0.5);
        assert!((d - 1.0).abs() < 1e-15);
    }
}
