//! `cqed-fit` library crate.
//!
//! Curve-fitting models for superconducting-qubit and resonator
//! measurements, with a Levenberg–Marquardt fitting engine.
//!
//! The binary (`qfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - models and the fitter are reusable from other analysis code

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod spectrum;

pub use domain::{Dataset, FitResult, Parameter, Parameters, Prediction, Values};
pub use error::{FitError, Result};
pub use fit::{SolverOptions, fit, fit_multi_start};
pub use models::Model;
pub use spectrum::fourier_spectrum;
