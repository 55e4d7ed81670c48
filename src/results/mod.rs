//! Result types of point calculations and Monte-Carlo simulations.
pub mod contribution;
pub mod full;
pub mod simple;
pub mod simulation;
pub mod statistics;
pub mod upstream;

pub use contribution::{Contribution, ContributionResult};
pub use full::FullResult;
pub use simple::SimpleResult;
pub use simulation::SimulationResult;
pub use statistics::Statistics;
pub use upstream::{product_label, UpstreamNode, UpstreamTree};
