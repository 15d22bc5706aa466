//! Fourier spectrum of sampled waveforms.
//!
//! Used to inspect drive pulses and time traces: a real channel, or an I/Q
//! pair interpreted as `i + j·q`, transformed with the sample spacing taken
//! from the first two time stamps.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::Serialize;

use crate::error::{FitError, Result};
use crate::math::{dft, fft_freq};

/// Display unit for spectrum frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrequencyUnit {
    Hz,
    MHz,
    GHz,
}

impl FrequencyUnit {
    /// Multiplier from Hz to this unit.
    pub fn scale(self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::MHz => 1e-6,
            FrequencyUnit::GHz => 1e-9,
        }
    }
}

impl FromStr for FrequencyUnit {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Hz" => Ok(FrequencyUnit::Hz),
            "MHz" => Ok(FrequencyUnit::MHz),
            "GHz" => Ok(FrequencyUnit::GHz),
            other => Err(FitError::InvalidUnit(other.to_string())),
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrequencyUnit::Hz => "Hz",
            FrequencyUnit::MHz => "MHz",
            FrequencyUnit::GHz => "GHz",
        };
        f.write_str(s)
    }
}

/// Transform of a waveform, in `fftfreq` order (non-negative frequencies first).
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub unit: FrequencyUnit,
    pub frequencies: Vec<f64>,
    /// DFT values scaled by the sample spacing.
    pub values: Vec<Complex64>,
}

impl Spectrum {
    pub fn magnitudes(&self) -> Vec<f64> {
        self.values.iter().map(|z| z.norm()).collect()
    }
}

/// Fourier transform of `i` (or `i + j·q`) sampled at times `t`.
pub fn fourier_spectrum(t: &[f64], i: &[f64], q: Option<&[f64]>, unit: FrequencyUnit) -> Result<Spectrum> {
    if t.len() < 2 {
        return Err(FitError::InvalidInput(
            "spectrum needs at least two samples".to_string(),
        ));
    }
    if i.len() != t.len() || q.is_some_and(|q| q.len() != t.len()) {
        return Err(FitError::InvalidInput(format!(
            "waveform lengths differ from the {} time stamps",
            t.len()
        )));
    }
    let dt = t[1] - t[0];
    if !(dt.is_finite() && dt != 0.0) {
        return Err(FitError::InvalidInput(format!("invalid sample spacing {dt}")));
    }

    let signal: Vec<Complex64> = match q {
        Some(q) => i.iter().zip(q).map(|(&re, &im)| Complex64::new(re, im)).collect(),
        None => i.iter().map(|&re| Complex64::new(re, 0.0)).collect(),
    };
    let values = dft(&signal).into_iter().map(|z| z * dt).collect();
    let frequencies = fft_freq(t.len(), dt)
        .into_iter()
        .map(|f| f * unit.scale())
        .collect();

    Ok(Spectrum {
        unit,
        frequencies,
        values,
    })
}
