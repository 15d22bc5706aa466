//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads measurements or builds sweeps
//! - runs fits, evaluations, simulations and spectra
//! - prints reports
//! - writes optional exports

use std::str::FromStr;

use clap::Parser;
use tracing::info;

use crate::cli::{Command, EvalArgs, FitArgs, SimulateArgs, SpectrumArgs};
use crate::data::{linspace, simulate};
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::models::Model;
use crate::spectrum::{FrequencyUnit, fourier_spectrum};

pub mod pipeline;

/// Entry point for the `qfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Models => {
            println!("{}", crate::report::format_catalog());
            Ok(())
        }
        Command::Fit(args) => handle_fit(args),
        Command::Eval(args) => handle_eval(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Spectrum(args) => handle_spectrum(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    if let Some(ms) = &run.multistart {
        println!("{}", crate::report::format_multistart(ms));
    }
    println!("{}", crate::report::format_fit_summary(&run.result, Some(&config)));

    if !run.result.success {
        return Err(AppError::new(
            4,
            format!("Fit did not converge: {}", run.result.message),
        ));
    }
    let residuals = crate::report::residual_magnitudes(&run.model, &run.data, &run.result)?;
    println!("{}", crate::report::format_residuals(&residuals));
    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let model = Model::from_name(&args.model)?;
    let params = pipeline::params_with_values(&model, &args.set)?;
    let x = sweep(&args)?;
    let y = model.eval(&x, &params)?;
    println!("{}", crate::report::format_prediction(&x, &y));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let model = Model::from_name(&args.eval.model)?;
    let params = pipeline::params_with_values(&model, &args.eval.set)?;
    let x = sweep(&args.eval)?;
    let data = simulate(&model, &x, &params, args.noise, args.seed)?;
    crate::io::write_dataset_csv(&args.out, &data)?;
    info!(
        model = %model.name(),
        points = data.len(),
        path = %args.out.display(),
        "wrote synthetic dataset"
    );
    Ok(())
}

fn handle_spectrum(args: SpectrumArgs) -> Result<(), AppError> {
    let unit = FrequencyUnit::from_str(&args.unit)?;
    let waveform = crate::io::load_waveform(&args.data)?;
    let spectrum = fourier_spectrum(&waveform.t, &waveform.i, waveform.q.as_deref(), unit)
        .map_err(|e| AppError::new(3, e.to_string()))?;
    println!("{}", crate::report::format_spectrum(&spectrum));
    Ok(())
}

fn sweep(args: &EvalArgs) -> Result<Vec<f64>, AppError> {
    let s = &args.sweep;
    if s.points == 0 || !(s.start.is_finite() && s.stop.is_finite()) {
        return Err(AppError::new(
            2,
            "Sweep needs finite --start/--stop and at least one point.",
        ));
    }
    Ok(linspace(s.start, s.stop, s.points))
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        model: args.model.clone(),
        data_path: args.data.clone(),
        complex: args.complex,
        values: args.set.clone(),
        bounds: args.bound.clone(),
        fixed: args.fix.clone(),
        starts: args.starts.max(1),
        spread: args.spread,
        seed: args.seed,
        max_nfev: args.max_nfev,
        export: args
            .export
            .clone()
            .or_else(|| args.save_report.then(|| crate::io::default_report_path(&args.data))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn config_mirrors_fit_flags() {
        let cli = Cli::parse_from([
            "qfit", "fit", "-m", "hanger", "-d", "s21.csv", "--complex", "--starts", "0",
            "--max-nfev", "500", "--export", "out.json",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let cfg = fit_config_from_args(&args);
        assert_eq!(cfg.model, "hanger");
        assert!(cfg.complex);
        assert_eq!(cfg.starts, 1);
        assert_eq!(cfg.max_nfev, Some(500));
        assert_eq!(cfg.export.as_deref(), Some(std::path::Path::new("out.json")));
    }

    #[test]
    fn save_report_writes_next_to_the_data() {
        let cli = Cli::parse_from(["qfit", "fit", "-m", "t1", "-d", "runs/t1.csv", "--save-report"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let cfg = fit_config_from_args(&args);
        assert_eq!(cfg.export.as_deref(), Some(std::path::Path::new("runs/t1.fit.json")));

        let cli = Cli::try_parse_from([
            "qfit", "fit", "-m", "t1", "-d", "t1.csv", "--save-report", "--export", "x.json",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn empty_sweep_is_rejected() {
        let cli = Cli::parse_from(["qfit", "eval", "-m", "cos", "--start", "0", "--stop", "1", "--points", "0"]);
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(sweep(&args).unwrap_err().exit_code(), 2);
    }
}
