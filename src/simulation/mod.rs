//! Monte-Carlo simulation over the uncertainty of parameters, exchanges and
//! characterization factors.
pub mod simulator;

pub use simulator::Simulator;
