//! Builds the Creatomate timeline document consumed by step 7 (spec §4.6).

pub mod builder;
pub mod error;

pub use builder::build;
pub use error::{CompositionError, CompositionResult};
