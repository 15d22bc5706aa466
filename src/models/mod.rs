//! Model library.
//!
//! - `functions`: closed-form formulas (pure scalar functions)
//! - `catalog`: the named registry binding formulas to parameter tables
//! - `builtin`: generic shapes (constant, linear, polynomial, Lorentzian peak)
//! - `composite`: sum/product of two models
//! - `model`: the fit-ready [`Model`] type

pub mod builtin;
pub mod catalog;
pub mod composite;
pub mod functions;
pub mod model;

pub use builtin::*;
pub use catalog::*;
pub use composite::{CombineRule, CompositeModel, lorentz_with_background, poly_bg_hanger_composite};
pub use model::*;
