//! Fit-ready models.
//!
//! A [`Model`] binds a formula (catalog entry, built-in shape or composite) to
//! its ordered parameter names, default values and bounds. Models are
//! immutable and cheap to clone; one instance can be reused for any number of
//! datasets and fits.
//!
//! The fitter relies on two primitive operations:
//! - build a default parameter set (`make_params`, `guess`)
//! - predict `y(x)` given parameter values (`eval`)

use crate::domain::{Dataset, OutputKind, Parameter, Parameters, Values};
use crate::error::{FitError, Result};
use crate::models::builtin::Builtin;
use crate::models::catalog::ModelKind;
use crate::models::composite::{self, CombineRule, CompositeModel};

/// Where a model's formula comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    Catalog(ModelKind),
    Builtin(Builtin),
    Composite(Box<CompositeModel>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    source: ModelSource,
    /// Prepended to every parameter name (e.g. `"a_"` for two peaks).
    prefix: String,
}

/// One row of a model's parameter table: `(name, default, min, max)`.
pub(crate) type ParamRow = (String, f64, f64, f64);

impl Model {
    pub fn catalog(kind: ModelKind) -> Self {
        Self {
            source: ModelSource::Catalog(kind),
            prefix: String::new(),
        }
    }

    pub fn builtin(builtin: Builtin) -> Self {
        Self {
            source: ModelSource::Builtin(builtin),
            prefix: String::new(),
        }
    }

    pub fn polynomial(degree: usize) -> Result<Self> {
        Ok(Self::builtin(Builtin::polynomial(degree)?))
    }

    pub(crate) fn composite(model: CompositeModel) -> Self {
        Self {
            source: ModelSource::Composite(Box::new(model)),
            prefix: String::new(),
        }
    }

    /// `left + right`, fit as one problem over the union of parameters.
    pub fn sum(left: Model, right: Model) -> Result<Self> {
        CompositeModel::new(left, right, CombineRule::Sum).map(Self::composite)
    }

    /// `left × right`, fit as one problem over the union of parameters.
    pub fn product(left: Model, right: Model) -> Result<Self> {
        CompositeModel::new(left, right, CombineRule::Product).map(Self::composite)
    }

    /// Resolve a model by catalog name/alias, built-in shape name or named composite.
    pub fn from_name(name: &str) -> Result<Self> {
        if let Ok(kind) = ModelKind::from_name(name) {
            return Ok(Self::catalog(kind));
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(Self::builtin(builtin?));
        }
        if let Some(model) = composite::named(name) {
            return Ok(model);
        }
        Err(FitError::UnknownModel(name.trim().to_string()))
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = format!("{prefix}{}", self.prefix);
        self
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> String {
        let base = match &self.source {
            ModelSource::Catalog(kind) => kind.name().to_string(),
            ModelSource::Builtin(b) => b.name(),
            ModelSource::Composite(c) => c.name(),
        };
        if self.prefix.is_empty() {
            base
        } else {
            format!("{base}[{}]", self.prefix)
        }
    }

    pub fn output_kind(&self) -> OutputKind {
        match &self.source {
            ModelSource::Catalog(kind) => kind.output(),
            ModelSource::Builtin(_) => OutputKind::Real,
            ModelSource::Composite(c) => c.output_kind(),
        }
    }

    pub(crate) fn param_table(&self) -> Vec<ParamRow> {
        let rows: Vec<ParamRow> = match &self.source {
            ModelSource::Catalog(kind) => kind
                .params()
                .iter()
                .map(|s| (s.name.to_string(), s.default, s.min, s.max))
                .collect(),
            ModelSource::Builtin(b) => b.params(),
            ModelSource::Composite(c) => c.param_table(),
        };
        rows.into_iter()
            .map(|(name, d, lo, hi)| (format!("{}{name}", self.prefix), d, lo, hi))
            .collect()
    }

    pub fn n_params(&self) -> usize {
        match &self.source {
            ModelSource::Catalog(kind) => kind.params().len(),
            ModelSource::Builtin(b) => b.params().len(),
            ModelSource::Composite(c) => c.n_params(),
        }
    }

    pub fn param_names(&self) -> Vec<String> {
        self.param_table().into_iter().map(|row| row.0).collect()
    }

    /// Parameters at their default values and bounds.
    pub fn make_params(&self) -> Parameters {
        let items = self
            .param_table()
            .into_iter()
            .map(|(name, value, min, max)| Parameter::new(name, value).with_bounds(min, max))
            .collect();
        Parameters::new(self.name(), items)
    }

    /// Parameters initialized by the model's default heuristic for `data`.
    ///
    /// Falls back to [`Model::make_params`] values wherever no heuristic applies.
    pub fn guess(&self, data: &Dataset) -> Parameters {
        crate::fit::guess::guess_params(self, data)
    }

    /// Pure evaluation at `x` (no fitting).
    pub fn eval(&self, x: &[f64], params: &Parameters) -> Result<Values> {
        let expected = self.param_names();
        if params.names() != expected.iter().map(String::as_str).collect::<Vec<_>>() {
            return Err(FitError::InvalidInput(format!(
                "parameters of '{}' do not match model {} (expected {})",
                params.owner(),
                self.name(),
                expected.join(", ")
            )));
        }
        Ok(self.eval_unchecked(x, &params.values()))
    }

    /// Pure evaluation with values in model parameter order.
    pub fn eval_values(&self, x: &[f64], values: &[f64]) -> Result<Values> {
        if values.len() != self.n_params() {
            return Err(FitError::InvalidInput(format!(
                "model {} takes {} parameters, got {}",
                self.name(),
                self.n_params(),
                values.len()
            )));
        }
        Ok(self.eval_unchecked(x, values))
    }

    pub(crate) fn eval_unchecked(&self, x: &[f64], values: &[f64]) -> Values {
        match &self.source {
            ModelSource::Catalog(kind) => kind.eval(x, values),
            ModelSource::Builtin(b) => Values::Real(b.eval(x, values)),
            ModelSource::Composite(c) => c.eval(x, values),
        }
    }
}
