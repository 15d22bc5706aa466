//! Composition of two models into one fit problem.
//!
//! A composite evaluates both constituents and combines them element-wise.
//! Its parameter list is the left model's parameters followed by the right
//! model's; names must not overlap (use [`Model::with_prefix`] to combine two
//! copies of the same shape).

use std::collections::HashSet;

use crate::domain::{OutputKind, Values};
use crate::error::{FitError, Result};
use crate::models::builtin::{Builtin, MAX_POLY_DEGREE};
use crate::models::catalog::ModelKind;
use crate::models::model::{Model, ModelSource, ParamRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineRule {
    Sum,
    Product,
}

impl CombineRule {
    fn symbol(self) -> &'static str {
        match self {
            CombineRule::Sum => "+",
            CombineRule::Product => "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeModel {
    left: Model,
    right: Model,
    rule: CombineRule,
}

impl CompositeModel {
    pub fn new(left: Model, right: Model, rule: CombineRule) -> Result<Self> {
        let left_names: HashSet<String> = left.param_names().into_iter().collect();
        let overlap: Vec<String> = right
            .param_names()
            .into_iter()
            .filter(|n| left_names.contains(n))
            .collect();
        if !overlap.is_empty() {
            return Err(FitError::IncompatibleComposition(format!(
                "{} {} {} share parameter names [{}]; give one side a prefix",
                left.name(),
                rule.symbol(),
                right.name(),
                overlap.join(", ")
            )));
        }
        Ok(Self { left, right, rule })
    }

    pub fn left(&self) -> &Model {
        &self.left
    }

    pub fn right(&self) -> &Model {
        &self.right
    }

    pub fn rule(&self) -> CombineRule {
        self.rule
    }

    pub fn name(&self) -> String {
        format!(
            "({} {} {})",
            self.left.name(),
            self.rule.symbol(),
            self.right.name()
        )
    }

    pub fn output_kind(&self) -> OutputKind {
        match (self.left.output_kind(), self.right.output_kind()) {
            (OutputKind::Real, OutputKind::Real) => OutputKind::Real,
            _ => OutputKind::Complex,
        }
    }

    pub fn n_params(&self) -> usize {
        self.left.n_params() + self.right.n_params()
    }

    pub(crate) fn param_table(&self) -> Vec<ParamRow> {
        let mut rows = side_table(&self.left, self.rule);
        rows.extend(side_table(&self.right, self.rule));
        rows
    }

    pub(crate) fn eval(&self, x: &[f64], values: &[f64]) -> Values {
        let (lp, rp) = values.split_at(self.left.n_params());
        let a = self.left.eval_unchecked(x, lp);
        let b = self.right.eval_unchecked(x, rp);
        combine(a, b, self.rule)
    }
}

/// Parameter rows of one side; built-in factors of a product start at the identity.
fn side_table(model: &Model, rule: CombineRule) -> Vec<ParamRow> {
    let mut rows = model.param_table();
    if let (CombineRule::Product, ModelSource::Builtin(b)) = (rule, model.source()) {
        for (row, default) in rows.iter_mut().zip(b.product_defaults()) {
            row.1 = default;
        }
    }
    rows
}

fn combine(a: Values, b: Values, rule: CombineRule) -> Values {
    match (a, b) {
        (Values::Real(a), Values::Real(b)) => Values::Real(
            a.iter()
                .zip(&b)
                .map(|(&u, &v)| match rule {
                    CombineRule::Sum => u + v,
                    CombineRule::Product => u * v,
                })
                .collect(),
        ),
        (a, b) => {
            let a = a.into_complex();
            let b = b.into_complex();
            Values::Complex(
                a.iter()
                    .zip(&b)
                    .map(|(&u, &v)| match rule {
                        CombineRule::Sum => u + v,
                        CombineRule::Product => u * v,
                    })
                    .collect(),
            )
        }
    }
}

/// Lorentzian peak on a linear background.
pub fn lorentz_with_background() -> Model {
    Model::composite(CompositeModel {
        left: Model::builtin(Builtin::LorentzPeak),
        right: Model::builtin(Builtin::Linear),
        rule: CombineRule::Sum,
    })
}

/// Hanger amplitude multiplied by a degree-7 polynomial in raw frequency.
pub fn poly_bg_hanger_composite() -> Model {
    Model::composite(CompositeModel {
        left: Model::catalog(ModelKind::HangerFuncAmplitude),
        right: Model::builtin(Builtin::Polynomial {
            degree: MAX_POLY_DEGREE,
        }),
        rule: CombineRule::Product,
    })
}

/// Named composites, by name (case-insensitive).
pub(crate) fn named(name: &str) -> Option<Model> {
    match name.trim().to_ascii_lowercase().as_str() {
        "lorentzwithbackground" | "lorentz_w_background_model" => Some(lorentz_with_background()),
        "polybghangercomposite" => Some(poly_bg_hanger_composite()),
        _ => None,
    }
}

/// Names accepted by [`named`], for listings.
pub const NAMED_COMPOSITES: [&str; 2] = ["LorentzWithBackground", "PolyBgHangerComposite"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_names_are_rejected() {
        let a = Model::catalog(ModelKind::LorentzFunc);
        let b = Model::catalog(ModelKind::LorentzFunc);
        let err = Model::sum(a, b).unwrap_err();
        assert!(matches!(err, FitError::IncompatibleComposition(_)));
    }

    #[test]
    fn prefixed_copies_compose() {
        let a = Model::catalog(ModelKind::LorentzFunc).with_prefix("a_");
        let b = Model::catalog(ModelKind::LorentzFunc).with_prefix("b_");
        let m = Model::sum(a.clone(), b.clone()).unwrap();
        assert_eq!(m.n_params(), 6);

        let x = [-0.5, 0.0, 0.7];
        let pa = [1.0, 0.0, 0.3];
        let pb = [2.0, 0.5, 0.2];
        let mut all = pa.to_vec();
        all.extend_from_slice(&pb);

        let ya = a.eval_values(&x, &pa).unwrap();
        let yb = b.eval_values(&x, &pb).unwrap();
        let y = m.eval_values(&x, &all).unwrap();
        for i in 0..x.len() {
            let expected = ya.as_real().unwrap()[i] + yb.as_real().unwrap()[i];
            assert_eq!(y.as_real().unwrap()[i], expected);
        }
    }

    #[test]
    fn product_of_complex_and_real_is_complex() {
        let m = Model::product(
            Model::catalog(ModelKind::HangerFuncComplex),
            Model::builtin(Builtin::Constant),
        )
        .unwrap();
        assert_eq!(m.output_kind(), OutputKind::Complex);

        let x = [7.0e9, 7.0001e9];
        let hanger = [7.0, 1e4, 2e4, 1.0, 0.1];
        let mut values = hanger.to_vec();
        values.push(2.0);
        let y = m.eval_values(&x, &values).unwrap();
        let h = Model::catalog(ModelKind::HangerFuncComplex)
            .eval_values(&x, &hanger)
            .unwrap();
        for (z, w) in y.as_complex().unwrap().iter().zip(h.as_complex().unwrap()) {
            assert!((z - 2.0 * w).norm() < 1e-12);
        }
    }

    #[test]
    fn product_background_starts_at_identity() {
        let m = poly_bg_hanger_composite();
        let p = m.make_params();
        assert_eq!(p.value("c0"), Some(1.0));
        assert_eq!(p.value("c7"), Some(0.0));

        let x = [6.9999e9, 7.0e9, 7.0001e9];
        let y = m.eval(&x, &p).unwrap();
        let hanger = Model::catalog(ModelKind::HangerFuncAmplitude);
        let h = hanger.eval(&x, &hanger.make_params()).unwrap();
        assert_eq!(y, h);
    }

    #[test]
    fn lorentz_with_background_parameter_order() {
        let m = lorentz_with_background();
        assert_eq!(
            m.param_names(),
            vec!["amplitude", "center", "sigma", "slope", "intercept"]
        );
        assert_eq!(m.name(), "(LorentzPeak + Linear)");
    }
}
