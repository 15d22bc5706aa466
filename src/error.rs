//! Error types.
//!
//! Two layers:
//!
//! - [`FitError`]: configuration and input errors raised by the library.
//!   Solver non-convergence is *not* an error; it is reported through
//!   `FitResult::success`.
//! - [`AppError`]: what the `qfit` binary surfaces, carrying a process exit code.

use thiserror::Error;

/// Library error.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FitError {
    /// A parameter name that the model does not define.
    #[error("Unknown parameter '{name}' for model {model}")]
    UnknownParameter { model: String, name: String },

    /// Lower bound above upper bound (or NaN bounds).
    #[error("Invalid bounds for '{name}': min={min}, max={max}")]
    InvalidBounds { name: String, min: f64, max: f64 },

    /// Two models cannot be combined into one fit problem.
    #[error("Unsupported composition: {0}")]
    IncompatibleComposition(String),

    /// Model name not present in the catalog.
    #[error("Unknown model '{0}' (run `qfit models` for the list)")]
    UnknownModel(String),

    /// Unrecognized frequency unit string.
    #[error("units \"{0}\" not recognized, valid options are GHz, MHz and Hz")]
    InvalidUnit(String),

    /// Polynomial degree outside the supported range.
    #[error("Unsupported polynomial degree {degree} (max {max})")]
    UnsupportedDegree { degree: usize, max: usize },

    /// Malformed input arrays for a non-fit operation (evaluation, spectrum).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, FitError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_error_maps_to_config_exit_code() {
        let err: AppError = FitError::InvalidUnit("kHz".to_string()).into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("kHz"));
    }
}
