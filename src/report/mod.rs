//! Reporting utilities: residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{Dataset, FitResult, Values};
use crate::error::{FitError, Result};
use crate::models::Model;

/// `|y_obs - y_fit|` at every data point for a finished fit.
pub fn residual_magnitudes(model: &Model, data: &Dataset, fit: &FitResult) -> Result<Vec<f64>> {
    let predicted = model.eval_values(&data.x, &fit.values())?;
    match (&data.y, &predicted) {
        (Values::Real(y), Values::Real(m)) => Ok(y.iter().zip(m).map(|(a, b)| (a - b).abs()).collect()),
        (Values::Complex(y), Values::Complex(m)) => {
            Ok(y.iter().zip(m).map(|(a, b)| (a - b).norm()).collect())
        }
        _ => Err(FitError::InvalidInput(format!(
            "model {} and data differ in output kind",
            model.name()
        ))),
    }
}
