//! Structural records consumed by the calculation core.
pub mod registry;
pub mod types;
pub mod uncertainty;

pub use registry::Registry;
pub use types::*;
pub use uncertainty::Uncertainty;
