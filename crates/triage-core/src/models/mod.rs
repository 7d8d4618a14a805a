//! Domain models for the triage system.

mod catalog;
mod labels;
mod prediction;

pub use catalog::*;
pub use labels::*;
pub use prediction::*;
