//! Curve fitting.
//!
//! Responsibilities:
//!
//! - derive default initial guesses from data (`guess`)
//! - minimize residuals with Levenberg–Marquardt (`solver`)
//! - validate problems and report results and statistics (`fitter`)
//! - fit several starting points in parallel and pick the best (`multistart`)

pub mod fitter;
pub mod guess;
pub mod multistart;
pub mod solver;

pub use fitter::*;
pub use multistart::*;
pub use solver::{SolverOptions, Termination};
