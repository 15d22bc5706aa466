//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - datasets and model outputs (`Dataset`, `Values`)
//! - fit parameters (`Parameter`, `Parameters`)
//! - fit outputs (`FitResult`, `ParamEstimate`, `FitQuality`)
//! - the CLI run configuration (`FitConfig`)

pub mod types;

pub use types::*;
