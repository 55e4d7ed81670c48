//! Matrix-based life cycle inventory and impact calculations.
//!
//! A product system is turned into a technology matrix `A` (products x
//! products), an intervention matrix `B` (flows x products) and, with an
//! impact method, a characterization matrix `C`. Results follow from
//! `A * s = d * e0`, `g = B * s` and `h = C * g`.
//!
//! The usual entry point is [`SystemCalculator`]: it validates a
//! [`CalculationSetup`], builds the matrices with a shared [`MatrixCache`]
//! and calculates simple, contribution or full results, or hands the
//! matrices to a Monte-Carlo [`Simulator`].

pub mod cache;
pub mod calculation;
pub mod config;
pub mod error;
pub mod formula;
pub mod index;
pub mod inventory;
pub mod matrix;
pub mod model;
pub mod results;
pub mod simulation;
pub mod solver;
pub mod validation;

#[cfg(test)]
mod testing;

pub use cache::MatrixCache;
pub use calculation::{CalculationHandle, CalculationSetup, LcaCalculator, SystemCalculator};
pub use config::EngineConfig;
pub use error::{LcaError, Result};
pub use index::{FlowIndex, ImpactIndex, ProcessProduct, TechIndex};
pub use inventory::{InventoryBuilder, MatrixData};
pub use matrix::{DenseMatrix, Matrix};
pub use results::{ContributionResult, FullResult, SimpleResult, SimulationResult, Statistics};
pub use simulation::Simulator;
pub use solver::{create_solver, MatrixSolver, SolverKind};
