//! Synthetic measurement generation.
//!
//! Evaluates a model on a sweep and adds seeded Gaussian noise, so fits and
//! CLI runs can be reproduced without hardware. Complex models get
//! independent noise on each quadrature.

use num_complex::Complex64;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Dataset, Parameters, Values};
use crate::error::{FitError, Result};
use crate::models::Model;

/// `points` evenly spaced samples from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Model prediction at `x` plus Gaussian noise of standard deviation `noise`.
pub fn simulate(model: &Model, x: &[f64], params: &Parameters, noise: f64, seed: u64) -> Result<Dataset> {
    let normal = Normal::new(0.0, noise)
        .map_err(|e| FitError::InvalidInput(format!("invalid noise level {noise}: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let clean = model.eval(x, params)?;
    if !clean.all_finite() {
        return Err(FitError::InvalidInput(format!(
            "model {} is not finite on the requested sweep",
            model.name()
        )));
    }

    let y = match clean {
        Values::Real(v) => Values::Real(v.into_iter().map(|y| y + normal.sample(&mut rng)).collect()),
        Values::Complex(v) => Values::Complex(
            v.into_iter()
                .map(|z| {
                    let re = normal.sample(&mut rng);
                    let im = normal.sample(&mut rng);
                    z + Complex64::new(re, im)
                })
                .collect(),
        ),
    };

    Ok(Dataset { x: x.to_vec(), y })
}
