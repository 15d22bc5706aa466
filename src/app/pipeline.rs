//! Shared "fit pipeline" logic used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! resolve model -> load data -> build parameters -> fit (single or multi-start) -> export
//!
//! The command handlers can then focus on presentation.

use tracing::info;

use crate::domain::{Dataset, FitConfig, FitResult, Parameters};
use crate::error::{AppError, Result};
use crate::fit::{MultiStartResult, SolverOptions, fit, fit_multi_start, jittered_starts};
use crate::io::{load_dataset, write_fit_report};
use crate::models::Model;

/// All computed outputs of a single `qfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub model: Model,
    pub data: Dataset,
    pub result: FitResult,
    /// Present when more than one start was requested.
    pub multistart: Option<MultiStartResult>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> std::result::Result<RunOutput, AppError> {
    let model = Model::from_name(&config.model)?;
    let data = load_dataset(&config.data_path, config.complex)?;
    info!(
        model = %model.name(),
        points = data.len(),
        path = %config.data_path.display(),
        "loaded dataset"
    );
    run_fit_on(config, model, data)
}

/// Execute the pipeline on already loaded data.
pub fn run_fit_on(config: &FitConfig, model: Model, data: Dataset) -> std::result::Result<RunOutput, AppError> {
    let params = build_params(&model, &data, config)?;
    let opts = SolverOptions {
        max_nfev: config.max_nfev,
        ..SolverOptions::default()
    };

    let (result, multistart) = if config.starts <= 1 {
        (fit(&model, &data, &params, &opts), None)
    } else {
        let starts = jittered_starts(&params, config.starts, config.spread, config.seed)?;
        let ms = fit_multi_start(&model, &data, &starts, &opts);
        info!(starts = starts.len(), best = ?ms.best, "multi-start finished");
        // Without a successful start, report the first one for diagnosis.
        let chosen = ms.best_result().unwrap_or(&ms.results[0]).clone();
        (chosen, Some(ms))
    };
    info!(
        success = result.success,
        chi_square = result.quality.chi_square,
        nfev = result.quality.nfev,
        "fit finished"
    );

    if let Some(path) = &config.export {
        write_fit_report(path, &result, Some(&config.data_path))?;
        info!(path = %path.display(), "wrote fit report");
    }

    Ok(RunOutput {
        model,
        data,
        result,
        multistart,
    })
}

/// Default guess for `data`, then the configured overrides (bounds, values, fixed).
///
/// Bounds clip the guessed values; explicit `values` are applied afterwards
/// and are taken as given.
pub fn build_params(model: &Model, data: &Dataset, config: &FitConfig) -> Result<Parameters> {
    let mut params = model.guess(data);
    for (name, min, max) in &config.bounds {
        params.set_bounds(name, *min, *max)?;
    }
    for (name, value) in &config.values {
        params.set_value(name, *value)?;
    }
    for name in &config.fixed {
        params.fix(name)?;
    }
    Ok(params)
}

/// Model defaults with `name=value` overrides (for evaluation and simulation).
pub fn params_with_values(model: &Model, values: &[(String, f64)]) -> Result<Parameters> {
    let mut params = model.make_params();
    for (name, value) in values {
        params.set_value(name, *value)?;
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{linspace, simulate};
    use crate::error::FitError;
    use crate::models::ModelKind;
    use std::path::PathBuf;

    fn config(model: &str) -> FitConfig {
        FitConfig {
            model: model.to_string(),
            data_path: PathBuf::from("memory.csv"),
            complex: false,
            values: Vec::new(),
            bounds: Vec::new(),
            fixed: Vec::new(),
            starts: 1,
            spread: 0.2,
            seed: 42,
            max_nfev: None,
            export: None,
        }
    }

    fn t1_data() -> (Model, Dataset) {
        let model = Model::catalog(ModelKind::ExpDecayFunc);
        let truth = params_with_values(
            &model,
            &[
                ("tau".to_string(), 15e-6),
                ("amplitude".to_string(), 0.9),
                ("offset".to_string(), 0.05),
            ],
        )
        .unwrap();
        let x = linspace(0.0, 60e-6, 121);
        let data = simulate(&model, &x, &truth, 0.0, 1).unwrap();
        (model, data)
    }

    #[test]
    fn single_start_pipeline_recovers_t1() {
        let (model, data) = t1_data();
        let mut cfg = config("t1");
        cfg.fixed = vec!["n".to_string()];
        let out = run_fit_on(&cfg, model, data).unwrap();
        assert!(out.result.success, "{}", out.result.message);
        assert!(out.multistart.is_none());
        assert!((out.result.value("tau").unwrap() - 15e-6).abs() < 1e-10);
    }

    #[test]
    fn multi_start_pipeline_reports_every_start() {
        let (model, data) = t1_data();
        let mut cfg = config("t1");
        cfg.starts = 4;
        let out = run_fit_on(&cfg, model, data).unwrap();
        let ms = out.multistart.unwrap();
        assert_eq!(ms.results.len(), 4);
        assert!(ms.best.is_some());
        assert!(out.result.success);
    }

    #[test]
    fn unknown_override_is_a_config_error() {
        let (model, data) = t1_data();
        let mut cfg = config("t1");
        cfg.values = vec![("T1".to_string(), 1e-5)];
        let err = build_params(&model, &data, &cfg).unwrap_err();
        assert!(matches!(err, FitError::UnknownParameter { .. }));

        let mut cfg = config("t1");
        cfg.bounds = vec![("tau".to_string(), 1.0, 0.0)];
        assert!(matches!(
            build_params(&model, &data, &cfg),
            Err(FitError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn user_bounds_clip_the_guess() {
        let (model, data) = t1_data();
        let mut cfg = config("t1");
        cfg.bounds = vec![("tau".to_string(), 20e-6, 40e-6)];
        cfg.fixed = vec!["n".to_string()];
        let params = build_params(&model, &data, &cfg).unwrap();
        assert_eq!(params.value("tau"), Some(20e-6));

        let out = run_fit_on(&cfg, model, data).unwrap();
        assert!(!out.result.message.contains("outside bounds"), "{}", out.result.message);
        let tau = out.result.value("tau").unwrap();
        assert!((20e-6..=40e-6).contains(&tau));
    }

    #[test]
    fn explicit_value_outside_user_bounds_still_fails() {
        let (model, data) = t1_data();
        let mut cfg = config("t1");
        cfg.bounds = vec![("tau".to_string(), 20e-6, 40e-6)];
        cfg.values = vec![("tau".to_string(), 5e-6)];
        let out = run_fit_on(&cfg, model, data).unwrap();
        assert!(!out.result.success);
        assert!(out.result.message.contains("outside bounds"));
    }

    #[test]
    fn unknown_model_exits_with_config_code() {
        let err = run_fit(&config("NoSuchModel")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
