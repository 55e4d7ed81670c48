//! Calculation setups and the calculators that turn them into results.
pub mod calculator;
pub mod dispatch;
pub mod setup;
pub mod system;

pub use calculator::LcaCalculator;
pub use dispatch::{dispatch, CalculationHandle};
pub use setup::CalculationSetup;
pub use system::SystemCalculator;
