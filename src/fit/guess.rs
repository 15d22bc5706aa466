//! Default initial guesses derived from the data.
//!
//! Every heuristic here is best-effort: it may return nothing (too few
//! points, degenerate data), in which case the model's defaults are used.
//! Guessed values are clamped into each parameter's bounds so a guess never
//! makes a fit fail validation.

use std::f64::consts::{E, PI};

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

use crate::domain::{Dataset, Parameters, Values};
use crate::math::{argmax, argmin, dft, mean, min_max, solve_least_squares};
use crate::models::{Builtin, Model, ModelKind, ModelSource, POLY_BG_DEGREE};

/// Parameters for `model` initialized from `data`.
pub fn guess_params(model: &Model, data: &Dataset) -> Parameters {
    let mut params = model.make_params();
    if let Some(values) = guess_values(model, data) {
        if values.len() == params.len() {
            let merged: Vec<f64> = params
                .items()
                .iter()
                .zip(&values)
                .map(|(p, &v)| if v.is_finite() { v.clamp(p.min, p.max) } else { p.value })
                .collect();
            params.set_values(&merged);
        }
    }
    params
}

fn guess_values(model: &Model, data: &Dataset) -> Option<Vec<f64>> {
    if data.len() < 2 || data.y.len() != data.len() {
        return None;
    }
    if !(data.x.iter().all(|v| v.is_finite()) && data.y.all_finite()) {
        return None;
    }
    match model.source() {
        ModelSource::Catalog(kind) => guess_catalog(*kind, data),
        ModelSource::Builtin(b) => guess_builtin(*b, &data.x, &observed(&data.y)),
        ModelSource::Composite(c) => {
            // The left constituent carries the feature; the right one keeps its
            // (identity or zero) defaults.
            let mut values = model.make_params().values();
            if let Some(left) = guess_values(c.left(), data) {
                values[..left.len()].copy_from_slice(&left);
            }
            Some(values)
        }
    }
}

/// Real observations, or magnitudes of complex ones.
fn observed(y: &Values) -> Vec<f64> {
    match y {
        Values::Real(v) => v.clone(),
        Values::Complex(_) => y.magnitude(),
    }
}

fn guess_catalog(kind: ModelKind, data: &Dataset) -> Option<Vec<f64>> {
    let x = &data.x;
    let y = observed(&data.y);
    let (lo, hi) = min_max(&y)?;
    let span = x_span(x)?;

    let values = match kind {
        ModelKind::RandomizedBenchmarkingDecay => {
            let offset = *y.last()?;
            let first = y[0] - offset;
            let mid = y.len() / 2;
            let dn = x[mid] - x[0];
            let ratio = (y[mid] - offset) / first;
            let p = if dn > 0.0 && ratio > 0.0 && ratio < 1.0 {
                ratio.powf(1.0 / dn)
            } else {
                0.99
            };
            vec![first / p.powf(x[0]), p, offset]
        }
        ModelKind::LorentzFunc => {
            let peak = find_peak(x, &y)?;
            vec![peak.height * PI * peak.hwhm, peak.center, peak.hwhm]
        }
        ModelKind::Lorentzian => {
            let peak = find_peak(x, &y)?;
            let kappa = peak.hwhm / 1e9;
            vec![peak.height * PI * kappa, peak.baseline, peak.center / 1e9, kappa]
        }
        ModelKind::TwinLorentzFunc => {
            let first = find_peak(x, &y)?;
            let second = find_second_peak(x, &y, &first, span / 10.0)
                .unwrap_or(first.center + span / 4.0);
            let sigma = first.hwhm;
            let second_height = value_near(x, &y, second) - first.baseline;
            let (a, b) = if first.center <= second {
                ((first.height, first.center), (second_height, second))
            } else {
                ((second_height, second), (first.height, first.center))
            };
            vec![
                a.0 * PI * sigma,
                b.0 * PI * sigma,
                a.1,
                b.1,
                sigma,
                sigma,
                first.baseline,
            ]
        }
        ModelKind::QubitFreqDac => {
            let sweet = x[argmax(&y)?];
            let reach = x.iter().map(|v| (v - sweet).abs()).fold(0.0_f64, f64::max);
            let coef = if reach > 0.0 { PI / (2.0 * reach) } else { 1.0 };
            vec![hi, 250e6, sweet, coef, 0.0]
        }
        ModelKind::QubitFreqFlux => vec![hi, 250e6, 1.0, x[argmax(&y)?]],
        ModelKind::CosFunc => {
            let tone = dominant_tones(x, &y, 1).into_iter().next()?;
            vec![(hi - lo) / 2.0, tone.frequency, tone.phase, mean(&y)?]
        }
        ModelKind::ExpDecayFunc => {
            let offset = *y.last()?;
            let amplitude = y[0] - offset;
            let tau = one_over_e_time(x, &y, offset).unwrap_or(span / 3.0);
            vec![tau, amplitude, offset, 1.0]
        }
        ModelKind::ExpDampOscFunc => {
            let tone = dominant_tones(x, &y, 1).into_iter().next()?;
            vec![
                span / 2.0,
                1.0,
                tone.frequency,
                tone.phase,
                (hi - lo) / 2.0,
                0.0,
                mean(&y)?,
            ]
        }
        ModelKind::GaussExpDampOscFunc => {
            let tone = dominant_tones(x, &y, 1).into_iter().next()?;
            vec![
                span,
                span,
                tone.frequency,
                tone.phase,
                (hi - lo) / 2.0,
                0.0,
                mean(&y)?,
            ]
        }
        ModelKind::ExpDampDblOscFunc => {
            let tones = dominant_tones(x, &y, 2);
            let first = tones.first()?;
            let second = tones.get(1).unwrap_or(first);
            vec![
                span / 2.0,
                1.0,
                first.frequency,
                second.frequency,
                first.phase,
                second.phase,
                first.amplitude,
                second.amplitude,
                0.0,
                0.0,
                mean(&y)?,
            ]
        }
        ModelKind::HangerFuncAmplitude | ModelKind::HangerFuncComplex => hanger_dip(x, &y)?.to_vec(),
        ModelKind::PolyBgHangerFuncAmplitude => {
            let mut v = hanger_dip(x, &y)?.to_vec();
            v.extend(std::iter::repeat_n(0.0, POLY_BG_DEGREE + 1));
            v
        }
        ModelKind::SlopedHangerFuncAmplitude => {
            let mut v = hanger_dip(x, &y)?.to_vec();
            v.push(0.0);
            v
        }
        ModelKind::SlopedHangerFuncComplex => {
            let mut v = hanger_dip(x, &y)?.to_vec();
            let (phi_v, phi_0) = match &data.y {
                Values::Complex(z) => phase_ramp(x, z)?,
                Values::Real(_) => (0.0, 0.0),
            };
            v.extend([phi_v, phi_0, 0.0]);
            v
        }
        ModelKind::LinearWithBackground => {
            let abs_x: Vec<f64> = x.iter().map(|v| v.abs()).collect();
            let near = argmin(&abs_x)?;
            let far = argmax(&abs_x)?;
            let b = y[near].abs();
            let a = if abs_x[far] > 0.0 {
                (y[far] * y[far] - b * b).max(0.0).sqrt() / abs_x[far]
            } else {
                1.0
            };
            vec![a, b]
        }
    };
    Some(values)
}

fn guess_builtin(builtin: Builtin, x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    match builtin {
        Builtin::Constant => Some(vec![mean(y)?]),
        Builtin::Linear => {
            let c = polyfit(x, y, 1)?;
            Some(vec![c[1], c[0]])
        }
        Builtin::Polynomial { degree } => polyfit(x, y, degree),
        Builtin::LorentzPeak => {
            let peak = find_peak(x, y)?;
            Some(vec![peak.height * PI * peak.hwhm, peak.center, peak.hwhm])
        }
    }
}

fn x_span(x: &[f64]) -> Option<f64> {
    let (lo, hi) = min_max(x)?;
    let span = hi - lo;
    (span > 0.0).then_some(span)
}

fn median(v: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = v.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    })
}

#[derive(Debug, Clone, Copy)]
struct Peak {
    center: f64,
    /// Signed height above the baseline.
    height: f64,
    hwhm: f64,
    baseline: f64,
}

/// Largest excursion from the median, with its half width at half maximum.
fn find_peak(x: &[f64], y: &[f64]) -> Option<Peak> {
    let baseline = median(y)?;
    let dev: Vec<f64> = y.iter().map(|v| (v - baseline).abs()).collect();
    let i = argmax(&dev)?;
    let height = y[i] - baseline;
    if height == 0.0 {
        return None;
    }

    let above_half = |j: usize| (y[j] - baseline) / height >= 0.5;
    let mut left = i;
    while left > 0 && above_half(left - 1) {
        left -= 1;
    }
    let mut right = i;
    while right + 1 < y.len() && above_half(right + 1) {
        right += 1;
    }
    let left_edge = if left > 0 { 0.5 * (x[left] + x[left - 1]) } else { x[left] };
    let right_edge = if right + 1 < y.len() { 0.5 * (x[right] + x[right + 1]) } else { x[right] };
    let mut hwhm = (right_edge - left_edge).abs() / 2.0;
    if hwhm <= 0.0 {
        hwhm = x_span(x)? / 20.0;
    }

    Some(Peak {
        center: x[i],
        height,
        hwhm,
        baseline,
    })
}

/// Center of the largest same-signed excursion at least `gap` away from `first`.
fn find_second_peak(x: &[f64], y: &[f64], first: &Peak, gap: f64) -> Option<f64> {
    let dev: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(&xv, &yv)| {
            if (xv - first.center).abs() > gap {
                (yv - first.baseline) * first.height.signum()
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect();
    argmax(&dev).map(|j| x[j])
}

fn value_near(x: &[f64], y: &[f64], at: f64) -> f64 {
    let dist: Vec<f64> = x.iter().map(|v| (v - at).abs()).collect();
    argmin(&dist).map(|j| y[j]).unwrap_or(0.0)
}

/// Time after the first sample at which `|y - offset|` first drops below 1/e of its start.
fn one_over_e_time(x: &[f64], y: &[f64], offset: f64) -> Option<f64> {
    let start = (y[0] - offset).abs();
    if start == 0.0 {
        return None;
    }
    let j = y.iter().position(|v| (v - offset).abs() <= start / E)?;
    let t = x[j] - x[0];
    (t > 0.0).then_some(t)
}

#[derive(Debug, Clone, Copy)]
struct Tone {
    frequency: f64,
    phase: f64,
    amplitude: f64,
}

/// Strongest positive-frequency components of the mean-subtracted signal.
///
/// Assumes uniform sampling. Neighbouring bins of an already selected tone
/// are skipped so leakage is not reported as a second tone.
fn dominant_tones(x: &[f64], y: &[f64], count: usize) -> Vec<Tone> {
    let n = y.len();
    if n < 4 {
        return Vec::new();
    }
    let dt = (x[n - 1] - x[0]) / (n - 1) as f64;
    if !(dt > 0.0) {
        return Vec::new();
    }
    let Some(m) = mean(y) else {
        return Vec::new();
    };

    let signal: Vec<Complex64> = y.iter().map(|&v| Complex64::new(v - m, 0.0)).collect();
    let spectrum = dft(&signal);
    let mut bins: Vec<usize> = (1..=n / 2).collect();
    bins.sort_by(|&a, &b| spectrum[b].norm().total_cmp(&spectrum[a].norm()));

    let mut picked: Vec<usize> = Vec::new();
    for k in bins {
        if picked.len() == count {
            break;
        }
        if picked.iter().any(|&p| p.abs_diff(k) <= 1) {
            continue;
        }
        picked.push(k);
    }

    picked
        .into_iter()
        .map(|k| {
            let frequency = k as f64 / (n as f64 * dt);
            let phase = wrap_phase(spectrum[k].arg() - 2.0 * PI * frequency * x[0]);
            Tone {
                frequency,
                phase,
                amplitude: 2.0 * spectrum[k].norm() / n as f64,
            }
        })
        .collect()
}

fn wrap_phase(phi: f64) -> f64 {
    let wrapped = (phi + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// Hanger guess `[f0 (GHz), Q, Qe, A, theta]` from the transmission dip.
fn hanger_dip(f: &[f64], mag: &[f64]) -> Option<[f64; 5]> {
    let n = mag.len();
    let baseline = 0.5 * (mag[0] + mag[n - 1]);
    if !(baseline > 0.0) {
        return None;
    }
    let i = argmin(mag)?;
    let f0_hz = f[i];
    if !(f0_hz > 0.0) {
        return None;
    }
    let depth = (1.0 - mag[i] / baseline).clamp(0.01, 0.99);

    let level = baseline * (1.0 - depth / 2.0);
    let mut left = i;
    while left > 0 && mag[left - 1] <= level {
        left -= 1;
    }
    let mut right = i;
    while right + 1 < n && mag[right + 1] <= level {
        right += 1;
    }
    let spacing = (f[n - 1] - f[0]).abs() / (n - 1) as f64;
    let width = (f[right] - f[left]).abs().max(spacing);
    let q = f0_hz / width;

    Some([f0_hz / 1e9, q, q / depth, baseline, 0.0])
}

/// Linear phase ramp `(slope per Hz, phase at the first sample)` from the sweep ends.
fn phase_ramp(f: &[f64], z: &[Complex64]) -> Option<(f64, f64)> {
    let phases = unwrap(&z.iter().map(|v| v.arg()).collect::<Vec<_>>());
    let n = phases.len();
    let df = f[n - 1] - f[0];
    if df == 0.0 {
        return None;
    }
    Some(((phases[n - 1] - phases[0]) / df, phases[0]))
}

fn unwrap(phases: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phases.len());
    let mut shift = 0.0;
    for (i, &p) in phases.iter().enumerate() {
        if i > 0 {
            let jump = p - phases[i - 1];
            if jump > PI {
                shift -= 2.0 * PI;
            } else if jump < -PI {
                shift += 2.0 * PI;
            }
        }
        out.push(p + shift);
    }
    out
}

/// Least-squares polynomial coefficients in ascending order.
fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    if x.len() <= degree {
        return None;
    }
    let a = DMatrix::from_fn(x.len(), degree + 1, |i, j| x[i].powi(j as i32));
    let b = DVector::from_column_slice(y);
    solve_least_squares(&a, &b).map(|c| c.iter().copied().collect())
}
