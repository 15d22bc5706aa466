//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - fit report JSON and dataset CSV exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
