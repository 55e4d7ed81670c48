//! Bidirectional position assignment for the rows and columns of the matrices.
pub mod dindex;
pub mod flow;
pub mod tech;

pub use dindex::{Index, Keyed};
pub use flow::{FlowDescriptor, FlowIndex, ImpactDescriptor, ImpactIndex};
pub use tech::{ProcessProduct, TechIndex};
