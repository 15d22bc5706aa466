//! Mathematical utilities: guarded model building blocks, least squares,
//! finite differences and the discrete Fourier transform.

pub mod basis;
pub mod numeric;
pub mod ols;

pub use basis::*;
pub use numeric::*;
pub use ols::*;
