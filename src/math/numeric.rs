//! Small numeric helpers: finite differences, summary statistics and a
//! direct discrete Fourier transform.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use num_complex::Complex64;

/// Forward-difference Jacobian of `f` at `x`.
///
/// `f0` must be `f(x)`. The step for component `j` is `eps·|x_j|`, or `eps`
/// when `x_j == 0`. Returns `None` if any evaluation fails or is non-finite.
pub fn finite_difference_jacobian<F>(f: &F, x: &[f64], f0: &[f64], eps: f64) -> Option<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Option<Vec<f64>>,
{
    let m = f0.len();
    let n = x.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut xp = x.to_vec();

    for j in 0..n {
        let h = if x[j] == 0.0 { eps } else { eps * x[j].abs() };
        xp[j] = x[j] + h;
        let fp = f(&xp)?;
        xp[j] = x[j];
        if fp.len() != m {
            return None;
        }
        let h_actual = (x[j] + h) - x[j];
        for i in 0..m {
            let d = (fp[i] - f0[i]) / h_actual;
            if !d.is_finite() {
                return None;
            }
            jac[(i, j)] = d;
        }
    }

    Some(jac)
}

pub fn sum_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    Some(v.iter().sum::<f64>() / v.len() as f64)
}

/// Minimum and maximum, ignoring non-finite entries.
pub fn min_max(v: &[f64]) -> Option<(f64, f64)> {
    let mut it = v.iter().copied().filter(|x| x.is_finite());
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
}

/// Index of the maximum value, ignoring non-finite entries.
pub fn argmax(v: &[f64]) -> Option<usize> {
    v.iter()
        .enumerate()
        .filter(|(_, x)| x.is_finite())
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Index of the minimum value, ignoring non-finite entries.
pub fn argmin(v: &[f64]) -> Option<usize> {
    v.iter()
        .enumerate()
        .filter(|(_, x)| x.is_finite())
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Direct DFT, `X_k = Σ x_n·exp(-2πi·k·n/N)` (numpy `fft` convention).
///
/// O(N²); waveforms and sweeps here are a few thousand samples at most.
pub fn dft(signal: &[Complex64]) -> Vec<Complex64> {
    let n = signal.len();
    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let mut acc = Complex64::new(0.0, 0.0);
        for (idx, &x) in signal.iter().enumerate() {
            // Reduce k·idx modulo n to keep the angle small for long signals.
            let kn = (k * idx) % n;
            let angle = -2.0 * PI * kn as f64 / n as f64;
            acc += x * Complex64::from_polar(1.0, angle);
        }
        out.push(acc);
    }
    out
}

/// Sample frequencies for a length-`n` DFT with spacing `dt` (numpy `fftfreq`).
pub fn fft_freq(n: usize, dt: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * dt);
    let half = n.div_ceil(2);
    (0..n)
        .map(|i| {
            let k = if i < half { i as f64 } else { i as f64 - n as f64 };
            k * scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_of_linear_map() {
        let f = |p: &[f64]| Some(vec![2.0 * p[0] + p[1], 3.0 * p[1]]);
        let x = [1.0, 2.0];
        let f0 = f(&x).unwrap();
        let jac = finite_difference_jacobian(&f, &x, &f0, 1e-7).unwrap();
        assert!((jac[(0, 0)] - 2.0).abs() < 1e-6);
        assert!((jac[(0, 1)] - 1.0).abs() < 1e-6);
        assert!(jac[(1, 0)].abs() < 1e-6);
        assert!((jac[(1, 1)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn jacobian_fails_on_failed_evaluation() {
        let f = |p: &[f64]| if p[0] > 1.0 { None } else { Some(vec![p[0]]) };
        let x = [1.0];
        let f0 = vec![1.0];
        assert!(finite_difference_jacobian(&f, &x, &f0, 1e-7).is_none());
    }

    #[test]
    fn dft_of_pure_tone_peaks_at_its_bin() {
        let n = 16;
        let signal: Vec<Complex64> = (0..n)
            .map(|i| Complex64::from_polar(1.0, 2.0 * PI * 3.0 * i as f64 / n as f64))
            .collect();
        let spec = dft(&signal);
        let mags: Vec<f64> = spec.iter().map(|z| z.norm()).collect();
        assert_eq!(argmax(&mags), Some(3));
        assert!((mags[3] - n as f64).abs() < 1e-9);
    }

    #[test]
    fn fft_freq_matches_numpy_order() {
        let f = fft_freq(4, 0.25);
        assert_eq!(f, vec![0.0, 1.0, -2.0, -1.0]);
        let g = fft_freq(5, 1.0);
        assert_eq!(g, vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn summary_helpers_handle_empty_input() {
        assert_eq!(mean(&[]), None);
        assert_eq!(min_max(&[]), None);
        assert_eq!(argmin(&[3.0, 1.0, 2.0]), Some(1));
    }
}
