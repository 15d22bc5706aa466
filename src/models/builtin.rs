//! Generic built-in shapes used as building blocks for composite models.

use crate::error::{FitError, Result};
use crate::math::poly_ascending;
use crate::models::functions::lorentz;

/// Highest supported polynomial degree.
pub const MAX_POLY_DEGREE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `c`
    Constant,
    /// `slope·x + intercept`
    Linear,
    /// `Σ c_k x^k`, `k = 0..=degree`
    Polynomial { degree: usize },
    /// `(amplitude/π)·σ/((x-center)² + σ²)`
    LorentzPeak,
}

impl Builtin {
    pub fn polynomial(degree: usize) -> Result<Self> {
        if degree > MAX_POLY_DEGREE {
            return Err(FitError::UnsupportedDegree {
                degree,
                max: MAX_POLY_DEGREE,
            });
        }
        Ok(Builtin::Polynomial { degree })
    }

    pub fn name(&self) -> String {
        match self {
            Builtin::Constant => "Constant".to_string(),
            Builtin::Linear => "Linear".to_string(),
            Builtin::Polynomial { degree } => format!("Polynomial{degree}"),
            Builtin::LorentzPeak => "LorentzPeak".to_string(),
        }
    }

    /// Parse `Constant`, `Linear`, `LorentzPeak` or `Polynomial<d>` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Result<Self>> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "constant" => Some(Ok(Builtin::Constant)),
            "linear" => Some(Ok(Builtin::Linear)),
            "lorentzpeak" | "lorentzmodel" => Some(Ok(Builtin::LorentzPeak)),
            _ => {
                let degree = lower.strip_prefix("polynomial")?.parse::<usize>().ok()?;
                Some(Builtin::polynomial(degree))
            }
        }
    }

    /// Parameter names with default values and bounds `(name, default, min, max)`.
    pub fn params(&self) -> Vec<(String, f64, f64, f64)> {
        let inf = f64::INFINITY;
        match self {
            Builtin::Constant => vec![("c".to_string(), 0.0, -inf, inf)],
            Builtin::Linear => vec![
                ("slope".to_string(), 0.0, -inf, inf),
                ("intercept".to_string(), 0.0, -inf, inf),
            ],
            Builtin::Polynomial { degree } => (0..=*degree)
                .map(|k| (format!("c{k}"), 0.0, -inf, inf))
                .collect(),
            Builtin::LorentzPeak => vec![
                ("amplitude".to_string(), 1.0, -inf, inf),
                ("center".to_string(), 0.0, -inf, inf),
                ("sigma".to_string(), 1.0, 0.0, inf),
            ],
        }
    }

    /// Default values when used as a multiplicative factor.
    ///
    /// Constant, linear and polynomial shapes start at the identity (`1`) so a
    /// product with another model does not collapse to zero.
    pub fn product_defaults(&self) -> Vec<f64> {
        match self {
            Builtin::Constant => vec![1.0],
            Builtin::Linear => vec![0.0, 1.0],
            Builtin::Polynomial { degree } => {
                let mut v = vec![0.0; degree + 1];
                v[0] = 1.0;
                v
            }
            Builtin::LorentzPeak => self.params().into_iter().map(|p| p.1).collect(),
        }
    }

    pub fn eval(&self, x: &[f64], p: &[f64]) -> Vec<f64> {
        match self {
            Builtin::Constant => vec![p[0]; x.len()],
            Builtin::Linear => x.iter().map(|&v| p[0] * v + p[1]).collect(),
            Builtin::Polynomial { .. } => x.iter().map(|&v| poly_ascending(p, v)).collect(),
            Builtin::LorentzPeak => x.iter().map(|&v| lorentz(v, p[0], p[1], p[2])).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_degree_is_capped() {
        assert!(Builtin::polynomial(7).is_ok());
        assert!(matches!(
            Builtin::polynomial(8),
            Err(FitError::UnsupportedDegree { degree: 8, .. })
        ));
    }

    #[test]
    fn parse_builtin_names() {
        assert_eq!(Builtin::from_name("linear").unwrap().unwrap(), Builtin::Linear);
        assert_eq!(
            Builtin::from_name("Polynomial3").unwrap().unwrap(),
            Builtin::Polynomial { degree: 3 }
        );
        assert!(Builtin::from_name("Polynomial9").unwrap().is_err());
        assert!(Builtin::from_name("CosFunc").is_none());
    }

    #[test]
    fn polynomial_eval_uses_ascending_coefficients() {
        let y = Builtin::Polynomial { degree: 2 }.eval(&[0.0, 1.0, 2.0], &[1.0, 0.0, 1.0]);
        assert_eq!(y, vec![1.0, 2.0, 5.0]);
    }

    #[test]
    fn product_defaults_are_identity() {
        let poly = Builtin::Polynomial { degree: 3 };
        let y = poly.eval(&[0.5, 10.0], &poly.product_defaults());
        assert_eq!(y, vec![1.0, 1.0]);
        let lin = Builtin::Linear;
        assert_eq!(lin.eval(&[4.0], &lin.product_defaults()), vec![1.0]);
    }
}
