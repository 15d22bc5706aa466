//! Command-line parsing for the `qfit` model fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! modeling/math code. Command dispatch lives in `crate::app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "qfit", version, about = "Curve fitting for superconducting-qubit measurements")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List catalog models with their parameters and defaults.
    Models,
    /// Fit a model to a CSV measurement and print the result.
    Fit(FitArgs),
    /// Evaluate a model on a sweep (no fitting).
    Eval(EvalArgs),
    /// Generate a noisy synthetic measurement from a model.
    Simulate(SimulateArgs),
    /// Fourier spectrum of a waveform CSV (`t,i` or `t,i,q`).
    Spectrum(SpectrumArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Model name or alias (see `qfit models`).
    #[arg(short = 'm', long)]
    pub model: String,

    /// CSV with columns `x,y` (or `x,re,im` with `--complex`).
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    /// Read complex data (`x,re,im`).
    #[arg(long)]
    pub complex: bool,

    /// Initial value override, `name=value` (repeatable).
    #[arg(long = "set", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    /// Keep a parameter fixed at its initial value (repeatable).
    #[arg(long = "fix")]
    pub fix: Vec<String>,

    /// Bounds override, `name=min:max` (repeatable; use `inf`/`-inf` for open ends).
    #[arg(long = "bound", value_parser = parse_bound)]
    pub bound: Vec<(String, f64, f64)>,

    /// Number of starting points; more than one enables parallel multi-start.
    #[arg(long, default_value_t = 1)]
    pub starts: usize,

    /// Relative jitter of the extra starting points.
    #[arg(long, default_value_t = 0.2)]
    pub spread: f64,

    /// Random seed for the extra starting points.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum number of model evaluations.
    #[arg(long)]
    pub max_nfev: Option<usize>,

    /// Write the fit report to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the fit report next to the data file (`sweep.csv` -> `sweep.fit.json`).
    #[arg(long, conflicts_with = "export")]
    pub save_report: bool,
}

/// Evenly spaced independent-variable sweep.
#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub start: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub stop: f64,

    #[arg(long, default_value_t = 101)]
    pub points: usize,
}

#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    /// Model name or alias.
    #[arg(short = 'm', long)]
    pub model: String,

    /// Parameter value, `name=value` (repeatable; unset parameters use defaults).
    #[arg(long = "set", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub eval: EvalArgs,

    /// Gaussian noise standard deviation (per quadrature for complex models).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV path.
    #[arg(short = 'o', long)]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SpectrumArgs {
    /// Waveform CSV.
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    /// Frequency unit: Hz, MHz or GHz.
    #[arg(long, default_value = "Hz")]
    pub unit: String,
}

/// Parse `name=value`.
pub fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number in '{s}'"))?;
    Ok((name.to_string(), value))
}

/// Parse `name=min:max`.
pub fn parse_bound(s: &str) -> Result<(String, f64, f64), String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=min:max, got '{s}'"))?;
    let (lo, hi) = range
        .split_once(':')
        .ok_or_else(|| format!("expected name=min:max, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid bound '{v}' in '{s}'"))
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((name.to_string(), parse(lo)?, parse(hi)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_parse() {
        assert_eq!(parse_assignment("tau=1e-5").unwrap(), ("tau".to_string(), 1e-5));
        assert!(parse_assignment("tau").is_err());
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("tau=abc").is_err());
    }

    #[test]
    fn bounds_parse_with_infinities() {
        let (name, lo, hi) = parse_bound("Q=0:inf").unwrap();
        assert_eq!(name, "Q");
        assert_eq!(lo, 0.0);
        assert!(hi.is_infinite());
        assert!(parse_bound("Q=0").is_err());
    }

    #[test]
    fn fit_command_collects_repeated_flags() {
        let cli = Cli::parse_from([
            "qfit", "fit", "--model", "CosModel", "--data", "sweep.csv", "--set", "frequency=5e6",
            "--set", "phase=0.1", "--fix", "offset", "--bound", "amplitude=0:2", "--starts", "4",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.set.len(), 2);
        assert_eq!(args.fix, vec!["offset"]);
        assert_eq!(args.bound, vec![("amplitude".to_string(), 0.0, 2.0)]);
        assert_eq!(args.starts, 4);
    }

    #[test]
    fn simulate_flattens_the_sweep() {
        let cli = Cli::parse_from([
            "qfit", "simulate", "--model", "t1", "--start", "0", "--stop", "1e-4", "--points", "50",
            "--noise", "0.01", "--out", "t1.csv",
        ]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.eval.sweep.points, 50);
        assert_eq!(args.noise, 0.01);
    }
}
