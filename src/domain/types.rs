//! Shared domain types.
//!
//! These types are kept small and (where they leave the library) serializable
//! so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON by the CLI
//! - handed to plotting collaborators as plain arrays

use std::path::PathBuf;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Whether a model produces real or complex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Real,
    Complex,
}

/// An array of model outputs or observations.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

/// Model output from pure evaluation.
pub type Prediction = Values;

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Real(v) => v.len(),
            Values::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            Values::Real(_) => OutputKind::Real,
            Values::Complex(_) => OutputKind::Complex,
        }
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            Values::Real(v) => Some(v),
            Values::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&[Complex64]> {
        match self {
            Values::Real(_) => None,
            Values::Complex(v) => Some(v),
        }
    }

    /// Promote to complex (real values get a zero imaginary part).
    pub fn into_complex(self) -> Vec<Complex64> {
        match self {
            Values::Real(v) => v.into_iter().map(|re| Complex64::new(re, 0.0)).collect(),
            Values::Complex(v) => v,
        }
    }

    /// Element-wise magnitude.
    pub fn magnitude(&self) -> Vec<f64> {
        match self {
            Values::Real(v) => v.iter().map(|x| x.abs()).collect(),
            Values::Complex(v) => v.iter().map(|z| z.norm()).collect(),
        }
    }

    pub fn all_finite(&self) -> bool {
        match self {
            Values::Real(v) => v.iter().all(|x| x.is_finite()),
            Values::Complex(v) => v.iter().all(|z| z.re.is_finite() && z.im.is_finite()),
        }
    }
}

/// Observed data: independent variable plus real or complex observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Vec<f64>,
    pub y: Values,
}

impl Dataset {
    pub fn real(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y: Values::Real(y) }
    }

    pub fn complex(x: Vec<f64>, y: Vec<Complex64>) -> Self {
        Self {
            x,
            y: Values::Complex(y),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A single named fit parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// `false` keeps the parameter fixed at `value` during a fit.
    pub vary: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            vary: true,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn in_bounds(&self) -> bool {
        self.value >= self.min && self.value <= self.max
    }
}

/// Ordered parameter set for one model.
///
/// Order matches the model's parameter order, so values can be handed to the
/// model's formula as a plain slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    owner: String,
    items: Vec<Parameter>,
}

impl Parameters {
    pub fn new(owner: impl Into<String>, items: Vec<Parameter>) -> Self {
        Self {
            owner: owner.into(),
            items,
        }
    }

    /// Name of the model these parameters belong to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.items.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| p.value)
    }

    /// Values in model order.
    pub fn values(&self) -> Vec<f64> {
        self.items.iter().map(|p| p.value).collect()
    }

    /// Indices of parameters that vary during a fit.
    pub fn free_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, p)| p.vary)
            .map(|(i, _)| i)
            .collect()
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        let owner = &self.owner;
        self.items
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| FitError::UnknownParameter {
                model: owner.clone(),
                name: name.to_string(),
            })
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        self.get_mut(name)?.value = value;
        Ok(())
    }

    /// Replace the bounds of `name`, clipping its current value into them.
    pub fn set_bounds(&mut self, name: &str, min: f64, max: f64) -> Result<()> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(FitError::InvalidBounds {
                name: name.to_string(),
                min,
                max,
            });
        }
        let p = self.get_mut(name)?;
        p.min = min;
        p.max = max;
        p.value = p.value.clamp(min, max);
        Ok(())
    }

    pub fn fix(&mut self, name: &str) -> Result<()> {
        self.get_mut(name)?.vary = false;
        Ok(())
    }

    /// Builder-style `set_value`.
    pub fn with_value(mut self, name: &str, value: f64) -> Result<Self> {
        self.set_value(name, value)?;
        Ok(self)
    }

    /// Overwrite values in model order (used by the solver).
    pub(crate) fn set_values(&mut self, values: &[f64]) {
        for (p, &v) in self.items.iter_mut().zip(values) {
            p.value = v;
        }
    }

    pub(crate) fn items(&self) -> &[Parameter] {
        &self.items
    }
}

/// Best-fit estimate for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamEstimate {
    pub name: String,
    pub value: f64,
    /// Standard error from the scaled covariance; absent when not estimable.
    pub stderr: Option<f64>,
    pub init_value: f64,
    pub vary: bool,
}

/// Goodness-of-fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    /// Sum of squared residuals (complex residuals count re² + im²).
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    pub rmse: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_data: usize,
    pub n_free: usize,
    pub nfev: usize,
}

impl FitQuality {
    pub(crate) fn empty(n_data: usize, n_free: usize) -> Self {
        Self {
            chi_square: f64::NAN,
            reduced_chi_square: f64::NAN,
            rmse: f64::NAN,
            aic: f64::NAN,
            bic: f64::NAN,
            n_data,
            n_free,
            nfev: 0,
        }
    }
}

/// Output of one fit invocation.
///
/// Always check `success` before trusting the values: failed fits keep the
/// last iterate (or the initial values) for diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: String,
    pub success: bool,
    pub message: String,
    pub params: Vec<ParamEstimate>,
    pub quality: FitQuality,
    /// Covariance of the free parameters, in `params` order of free entries.
    pub covariance: Option<Vec<Vec<f64>>>,
}

impl FitResult {
    /// A result flagged unsuccessful, carrying the given parameter values.
    pub(crate) fn failed(
        model: &str,
        params: &Parameters,
        n_data: usize,
        message: impl Into<String>,
    ) -> Self {
        let estimates = params
            .iter()
            .map(|p| ParamEstimate {
                name: p.name.clone(),
                value: p.value,
                stderr: None,
                init_value: p.value,
                vary: p.vary,
            })
            .collect();
        Self {
            model: model.to_string(),
            success: false,
            message: message.into(),
            params: estimates,
            quality: FitQuality::empty(n_data, params.free_indices().len()),
            covariance: None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamEstimate> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| p.value)
    }

    pub fn stderr(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|p| p.stderr)
    }

    /// Best-fit values in model order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }
}

/// A full CLI run's configuration.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub model: String,
    pub data_path: PathBuf,
    pub complex: bool,
    /// `name=value` initial-guess overrides.
    pub values: Vec<(String, f64)>,
    /// `name=min:max` bound overrides.
    pub bounds: Vec<(String, f64, f64)>,
    pub fixed: Vec<String>,
    /// Number of starts for multi-start fitting (1 = single fit).
    pub starts: usize,
    /// Relative jitter of the extra starts.
    pub spread: f64,
    pub seed: u64,
    pub max_nfev: Option<usize>,
    pub export: Option<PathBuf>,
}
