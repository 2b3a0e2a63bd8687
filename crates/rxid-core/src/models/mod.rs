//! Domain models for the rxid system.

mod drug;
mod pricing;
mod resolution;

pub use drug::*;
pub use pricing::*;
pub use resolution::*;
