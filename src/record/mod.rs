//! Record schema - one biodata document with both field generations.

pub mod model;

pub use model::*;
