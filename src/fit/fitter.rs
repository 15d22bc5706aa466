//! Single-model fit driver.
//!
//! Given:
//! - a model
//! - observed data `(x_i, y_i)` (real or complex)
//! - a parameter set (initial values, bounds, vary flags)
//!
//! we:
//! - validate the problem (shapes, kinds, finiteness, bounds)
//! - minimize `Σ |y_model(x_i) - y_i|²` over the free parameters with
//!   Levenberg–Marquardt
//! - derive goodness-of-fit statistics and the scaled covariance
//!
//! Invalid problems and non-convergence are reported through
//! `FitResult::success`, never as `Err`.

use tracing::warn;

use crate::domain::{Dataset, FitQuality, FitResult, OutputKind, ParamEstimate, Parameters, Values};
use crate::fit::solver::{SolverOptions, levenberg_marquardt};
use crate::math::normal_covariance;
use crate::models::Model;

/// Fit `model` to `data` starting from `params`.
pub fn fit(model: &Model, data: &Dataset, params: &Parameters, opts: &SolverOptions) -> FitResult {
    let n_obs = data.len();
    let result = match validate(model, data, params) {
        Err(message) => FitResult::failed(&model.name(), params, n_obs, message),
        Ok(()) => run(model, data, params, opts),
    };
    if !result.success {
        warn!(model = %result.model, message = %result.message, "fit failed");
    }
    result
}

/// Fit `model` to `data` starting from its default heuristic guess.
pub fn fit_with_guess(model: &Model, data: &Dataset, opts: &SolverOptions) -> FitResult {
    let params = model.guess(data);
    fit(model, data, &params, opts)
}

fn validate(model: &Model, data: &Dataset, params: &Parameters) -> Result<(), String> {
    let expected = model.param_names();
    if params.names() != expected.iter().map(String::as_str).collect::<Vec<_>>() {
        return Err(format!(
            "parameters of '{}' do not match model {}",
            params.owner(),
            model.name()
        ));
    }
    if data.is_empty() || data.y.is_empty() {
        return Err("empty dataset".to_string());
    }
    if data.x.len() != data.y.len() {
        return Err(format!(
            "x has {} points but y has {}",
            data.x.len(),
            data.y.len()
        ));
    }
    if model.output_kind() != data.y.kind() {
        return Err(format!(
            "model {} is {} but data is {}",
            model.name(),
            kind_label(model.output_kind()),
            kind_label(data.y.kind())
        ));
    }
    if data.x.iter().any(|v| !v.is_finite()) || !data.y.all_finite() {
        return Err("data contains non-finite values".to_string());
    }
    for p in params.iter() {
        if p.min.is_nan() || p.max.is_nan() || p.min > p.max {
            return Err(format!("invalid bounds for '{}': [{}, {}]", p.name, p.min, p.max));
        }
        if !p.value.is_finite() {
            return Err(format!("initial value of '{}' is not finite", p.name));
        }
        if !p.in_bounds() {
            return Err(format!(
                "initial value of '{}' ({}) outside bounds [{}, {}]",
                p.name, p.value, p.min, p.max
            ));
        }
    }
    let n_free = params.free_indices().len();
    if n_free == 0 {
        return Err("no free parameters".to_string());
    }
    // Complex points contribute two residuals each.
    let n_residuals = match data.y.kind() {
        OutputKind::Real => data.len(),
        OutputKind::Complex => 2 * data.len(),
    };
    if n_residuals < n_free {
        return Err(format!(
            "fewer data points than free parameters ({n_residuals} residuals, {n_free} free)"
        ));
    }
    Ok(())
}

fn kind_label(kind: OutputKind) -> &'static str {
    match kind {
        OutputKind::Real => "real",
        OutputKind::Complex => "complex",
    }
}

/// Stacked residuals `model - data`; complex values contribute real then imaginary parts.
fn residuals(model: &Model, x: &[f64], observed: &Values, values: &[f64]) -> Option<Vec<f64>> {
    let predicted = model.eval_unchecked(x, values);
    let out: Vec<f64> = match (&predicted, observed) {
        (Values::Real(m), Values::Real(y)) => m.iter().zip(y).map(|(a, b)| a - b).collect(),
        (Values::Complex(m), Values::Complex(y)) => m
            .iter()
            .zip(y)
            .flat_map(|(a, b)| {
                let d = a - b;
                [d.re, d.im]
            })
            .collect(),
        _ => return None,
    };
    out.iter().all(|v| v.is_finite()).then_some(out)
}

fn run(model: &Model, data: &Dataset, params: &Parameters, opts: &SolverOptions) -> FitResult {
    let free = params.free_indices();
    let base = params.values();
    let items = params.items();

    let expand = |free_values: &[f64]| {
        let mut full = base.clone();
        for (&i, &v) in free.iter().zip(free_values) {
            full[i] = v;
        }
        full
    };
    let objective = |free_values: &[f64]| residuals(model, &data.x, &data.y, &expand(free_values));

    let x0: Vec<f64> = free.iter().map(|&i| base[i]).collect();
    let lower: Vec<f64> = free.iter().map(|&i| items[i].min).collect();
    let upper: Vec<f64> = free.iter().map(|&i| items[i].max).collect();

    let report = levenberg_marquardt(objective, &x0, &lower, &upper, opts);

    let final_values = expand(&report.x);
    let mut fitted = params.clone();
    fitted.set_values(&final_values);

    if report.residuals.is_empty() {
        return FitResult::failed(&model.name(), params, data.len(), report.termination.message());
    }

    let n_res = report.residuals.len();
    let k = free.len();
    let quality = quality(report.cost, n_res, k, report.nfev);

    // Standard errors need N > k and a well-conditioned JᵀJ.
    let covariance = if n_res > k {
        report
            .jacobian
            .as_ref()
            .and_then(normal_covariance)
            .map(|c| c * quality.reduced_chi_square)
    } else {
        None
    };

    let mut stderr = vec![None; final_values.len()];
    if let Some(cov) = &covariance {
        for (j, &i) in free.iter().enumerate() {
            let var = cov[(j, j)];
            if var.is_finite() && var >= 0.0 {
                stderr[i] = Some(var.sqrt());
            }
        }
    }

    let estimates = fitted
        .iter()
        .zip(items)
        .zip(stderr)
        .map(|((p, init), stderr)| ParamEstimate {
            name: p.name.clone(),
            value: p.value,
            stderr,
            init_value: init.value,
            vary: p.vary,
        })
        .collect();

    FitResult {
        model: model.name(),
        success: report.termination.converged(),
        message: report.termination.message().to_string(),
        params: estimates,
        quality,
        covariance: covariance.map(|c| {
            (0..c.nrows())
                .map(|i| (0..c.ncols()).map(|j| c[(i, j)]).collect())
                .collect()
        }),
    }
}

/// Goodness-of-fit statistics for `n` residuals and `k` free parameters.
///
/// Information criteria use `n·ln(χ²/n)` as -2 log-likelihood (Gaussian,
/// unknown variance); χ² is floored so exact fits stay finite.
fn quality(chi_square: f64, n: usize, k: usize, nfev: usize) -> FitQuality {
    let n_f = n as f64;
    let k_f = k as f64;
    let neg2_log_likelihood = n_f * (chi_square.max(1e-250 * n_f) / n_f).ln();
    FitQuality {
        chi_square,
        reduced_chi_square: chi_square / (n.saturating_sub(k).max(1)) as f64,
        rmse: (chi_square / n_f).sqrt(),
        aic: neg2_log_likelihood + 2.0 * k_f,
        bic: neg2_log_likelihood + k_f * n_f.ln(),
        n_data: n,
        n_free: k,
        nfev,
    }
}
