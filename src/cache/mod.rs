//! Lookups reused across calculations over the same registry.
pub mod matrix_cache;
pub mod tables;

pub use matrix_cache::{CacheSnapshot, MatrixCache};
pub use tables::{ConversionTable, FlowTable};
